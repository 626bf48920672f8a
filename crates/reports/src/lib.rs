//! Printable financial reports.
//!
//! Reports are pure presentation over ledger aggregates: the composer builds a
//! [`ReportDocument`] and the renderers turn it into text. Nothing here reads
//! or writes the store.

pub mod compose;
pub mod document;
pub mod money;
pub mod text;

pub use compose::{compose_company_report, compose_project_report};
pub use document::{
    GENERAL_LABEL, ReportDocument, ReportFigures, ReportHeader, ReportRow, ReportScope, ReportSummary,
    SIGNATURE_LINES,
};
pub use money::format_money;
pub use text::render_text;
