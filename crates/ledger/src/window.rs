//! Employee visibility window.
//!
//! Employees only ever retrieve transactions recorded in the trailing window;
//! administrators are unrestricted. The window is a query-time predicate, not
//! a stored property of the row.

use chrono::{DateTime, Duration, Utc};

use obraledger_auth::Role;
use obraledger_core::{DomainError, DomainResult};

use crate::{Transaction, TransactionQuery};

pub const DEFAULT_EMPLOYEE_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityWindow {
    employee_window: Duration,
}

impl Default for VisibilityWindow {
    fn default() -> Self {
        Self {
            employee_window: Duration::hours(DEFAULT_EMPLOYEE_WINDOW_HOURS),
        }
    }
}

impl VisibilityWindow {
    pub fn hours(hours: i64) -> DomainResult<Self> {
        if hours <= 0 {
            return Err(DomainError::validation("visibility window must be positive"));
        }
        let employee_window = Duration::try_hours(hours)
            .ok_or_else(|| DomainError::validation(format!("visibility window of {hours}h is out of range")))?;
        Ok(Self { employee_window })
    }

    pub fn employee_window(&self) -> Duration {
        self.employee_window
    }

    /// Earliest creation timestamp `role` may see at `now`.
    pub fn cutoff(&self, role: Role, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match role {
            Role::Admin => None,
            Role::Employee => Some(now - self.employee_window),
        }
    }

    pub fn admits(&self, role: Role, now: DateTime<Utc>, tx: &Transaction) -> bool {
        self.cutoff(role, now).is_none_or(|cutoff| tx.created_at >= cutoff)
    }

    /// Narrow `query` for `role`. An existing, stricter cutoff is kept.
    pub fn restrict(&self, role: Role, now: DateTime<Utc>, query: TransactionQuery) -> TransactionQuery {
        let cutoff = match (query.created_since, self.cutoff(role, now)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        query.created_since(cutoff)
    }
}
