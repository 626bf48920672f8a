//! Capability checks: `(principal, resource, capability) -> allowed`.

use serde::Serialize;
use thiserror::Error;

use obraledger_core::CompanyId;

use crate::{Capability, Principal, Role};

/// What a capability is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Resource {
    /// Workspace-wide administration (company creation, grants).
    Workspace,
    /// A single company and everything it owns.
    Company(CompanyId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("company is outside the principal's scope")]
    OutOfScope,

    #[error("forbidden: missing capability '{0}'")]
    Forbidden(Capability),
}

/// Authorization policy seam.
///
/// Implementations must be pure: no IO, no panics.
pub trait AccessPolicy: Send + Sync {
    fn check(&self, principal: &Principal, resource: &Resource, capability: Capability) -> Result<(), AuthzError>;

    fn allows(&self, principal: &Principal, resource: &Resource, capability: Capability) -> bool {
        self.check(principal, resource, capability).is_ok()
    }
}

/// Default policy: administrators may do anything; employees may view and
/// record transactions inside the companies they were granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    fn employee_capabilities() -> &'static [Capability] {
        &[Capability::ViewCompany, Capability::RecordTransaction]
    }
}

impl AccessPolicy for RolePolicy {
    fn check(&self, principal: &Principal, resource: &Resource, capability: Capability) -> Result<(), AuthzError> {
        if let Resource::Company(company_id) = resource {
            if !principal.scope.contains(*company_id) {
                return Err(AuthzError::OutOfScope);
            }
        }

        let granted = match principal.role {
            Role::Admin => true,
            Role::Employee => {
                matches!(resource, Resource::Company(_))
                    && Self::employee_capabilities().contains(&capability)
            }
        };

        if granted {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(capability))
        }
    }
}

/// Authorize `principal` for `capability` on `resource`, logging denials.
pub fn authorize(
    policy: &dyn AccessPolicy,
    principal: &Principal,
    resource: &Resource,
    capability: Capability,
) -> Result<(), AuthzError> {
    policy.check(principal, resource, capability).inspect_err(|e| {
        tracing::info!(
            email = %principal.identity.email(),
            role = %principal.role,
            capability = %capability,
            ?resource,
            "authorization denied: {e}"
        );
    })
}
