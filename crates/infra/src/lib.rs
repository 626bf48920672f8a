//! Infrastructure layer: ledger persistence and configuration.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{
    DeletedEntity, DeletionReceipt, InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, RemovedRows,
    StoreError,
};
