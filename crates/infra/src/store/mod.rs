//! Ledger persistence behind the [`LedgerStore`] trait.

mod error;
mod in_memory;
mod postgres;
mod receipt;
mod r#trait;

pub use error::StoreError;
pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::LedgerStore;
pub use receipt::{DeletedEntity, DeletionReceipt, RemovedRows};
