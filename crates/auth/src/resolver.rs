//! Access resolution: identity → role + visible companies.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{AccessGrant, CompanyScope, Email, Identity, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Grants could not be loaded; access is never assumed in this case.
    #[error("access lookup failed: {0}")]
    Backend(String),
}

/// Resolves principals from identities.
///
/// Administrators are configuration data (a set of identities), not a literal
/// baked into the code. Everyone else is an employee whose scope is exactly the
/// set of companies named by their grants.
#[derive(Debug, Clone, Default)]
pub struct AccessResolver {
    administrators: BTreeSet<Email>,
}

impl AccessResolver {
    pub fn new<I>(administrators: I) -> Self
    where
        I: IntoIterator<Item = Email>,
    {
        Self {
            administrators: administrators.into_iter().collect(),
        }
    }

    pub fn role_of(&self, identity: &Identity) -> Role {
        if self.administrators.contains(identity.email()) {
            Role::Admin
        } else {
            Role::Employee
        }
    }

    /// Whether resolving `identity` needs its grants loaded.
    ///
    /// Administrators skip the lookup entirely.
    pub fn requires_grant_lookup(&self, identity: &Identity) -> bool {
        self.role_of(identity) == Role::Employee
    }

    /// Build the principal for `identity`.
    ///
    /// `grants` is ignored for administrators. Grants belonging to another
    /// subject are skipped, so callers may pass an unfiltered list.
    pub fn resolve(&self, identity: Identity, grants: &[AccessGrant]) -> Principal {
        let role = self.role_of(&identity);
        let scope = match role {
            Role::Admin => CompanyScope::All,
            Role::Employee => CompanyScope::Only(
                grants
                    .iter()
                    .filter(|g| &g.email == identity.email())
                    .map(|g| g.company_id)
                    .collect(),
            ),
        };

        Principal { identity, role, scope }
    }
}
