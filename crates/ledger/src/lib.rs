//! Ledger module: companies, projects and income/expense transactions.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod aggregate;
pub mod company;
pub mod grouping;
pub mod money;
pub mod project;
pub mod query;
pub mod transaction;
pub mod window;

pub use aggregate::{
    LedgerAggregator, LedgerLine, LedgerSummary, ProjectFinance, Totals, aggregate, chronological,
};
pub use company::{Company, CreateCompany};
pub use grouping::{ClientGroup, UNASSIGNED_CLIENT, group_by_client, normalize_client};
pub use money::{Amount, MAX_MONEY_UNITS, TransactionKind, check_money};
pub use project::{CreateProject, Project, UpdateBudget};
pub use query::{TransactionOrder, TransactionQuery};
pub use transaction::{RecordTransaction, Transaction};
pub use window::{DEFAULT_EMPLOYEE_WINDOW_HOURS, VisibilityWindow};
