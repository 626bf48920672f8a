use obraledger_auth::Principal;

/// Principal context for a request.
///
/// Resolved by the auth middleware from the bearer token and the current
/// grants; immutable for the lifetime of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
