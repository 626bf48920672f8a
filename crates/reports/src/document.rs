use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use obraledger_core::{CompanyId, ProjectId};

/// Label for entries booked without a project.
pub const GENERAL_LABEL: &str = "General";

/// Signature lines printed at the foot of every report.
pub const SIGNATURE_LINES: [&str; 2] = ["Responsible signature", "Audit signature"];

/// How much of the ledger a report discloses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFigures {
    /// Summary block, running balance and collection % over the full ledger.
    Full,
    /// Transaction listing only; no totals or balances.
    ListingOnly,
}

impl ReportFigures {
    pub fn includes_balances(&self) -> bool {
        matches!(self, ReportFigures::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportScope {
    Company { company_id: CompanyId },
    Project { company_id: CompanyId, project_id: ProjectId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    pub company_name: String,
    pub project_name: Option<String>,
    pub client: Option<String>,
    /// Contract budget; project reports only.
    pub budget: Option<Decimal>,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    /// Collected / budget × 100; project reports only.
    pub collection_percentage: Option<Decimal>,
}

/// One table row. Expenses fill `charge`, income fills `credit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub project: String,
    pub description: String,
    pub notes: Option<String>,
    pub charge: Option<Decimal>,
    pub credit: Option<Decimal>,
    /// Running balance; absent from listing-only reports.
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub scope: ReportScope,
    pub title: String,
    pub figures: ReportFigures,
    pub header: ReportHeader,
    /// Absent from listing-only reports.
    pub summary: Option<ReportSummary>,
    pub rows: Vec<ReportRow>,
    pub signatures: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl ReportDocument {
    pub fn generated_line(&self) -> String {
        format!("Generated by obraledger - {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}
