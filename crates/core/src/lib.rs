//! `obraledger-core`: shared domain building blocks.
//!
//! Identifiers, the domain error model and the entity/value-object markers used
//! by every other crate. No infrastructure concerns live here.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, GrantId, ProjectId, TransactionId};
pub use value_object::ValueObject;
