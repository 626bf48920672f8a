//! Tracing/logging setup shared by the binary and tests.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

/// Target used for audit events (deletions, grant changes).
pub const AUDIT_TARGET: &str = "audit";
