//! `obraledger-auth`: identity, access grants and authorization policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: callers load
//! grants from whatever backend they use and hand them to the resolver.

pub mod capability;
pub mod claims;
pub mod grant;
pub mod identity;
pub mod policy;
pub mod principal;
pub mod resolver;
pub mod roles;

pub use capability::Capability;
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use grant::{AccessGrant, GrantAccess};
pub use identity::{Email, Identity};
pub use policy::{AccessPolicy, AuthzError, Resource, RolePolicy, authorize};
pub use principal::{CompanyScope, Principal};
pub use resolver::{AccessError, AccessResolver};
pub use roles::Role;
