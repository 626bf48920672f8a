use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use obraledger_auth::AccessGrant;
use obraledger_core::ProjectId;
use obraledger_ledger::{
    ClientGroup, Company, LedgerLine, Project, ProjectFinance, Totals, Transaction,
};
use obraledger_reports::GENERAL_LABEL;

use crate::app::services::{CompanyBalances, CompanyDashboard, GrantListing, Me, ProjectDetail, ProjectListing};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub client: Option<String>,
    #[serde(default)]
    pub budget: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub budget: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecordTransactionRequest {
    pub project_id: Option<String>,
    /// `INCOME` or `EXPENSE` (case-insensitive).
    pub kind: String,
    pub amount: Decimal,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    pub description: String,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub email: String,
    pub company_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// `text` renders a printable plain-text document; JSON otherwise.
    pub format: Option<String>,
}

impl ReportQuery {
    pub fn wants_text(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("text"))
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn company_to_json(company: &Company) -> Value {
    json!({
        "id": company.id.to_string(),
        "name": company.name,
    })
}

pub fn project_to_json(project: &Project) -> Value {
    json!({
        "id": project.id.to_string(),
        "company_id": project.company_id.to_string(),
        "name": project.name,
        "client": project.client,
        "budget": project.budget,
    })
}

pub fn transaction_to_json(tx: &Transaction) -> Value {
    json!({
        "id": tx.id.to_string(),
        "company_id": tx.company_id.to_string(),
        "project_id": tx.project_id.map(|p| p.to_string()),
        "kind": tx.kind,
        "amount": tx.amount,
        "date": tx.date,
        "description": tx.description,
        "notes": tx.notes,
        "evidence_url": tx.evidence_url,
        "created_at": tx.created_at.to_rfc3339(),
    })
}

/// Transaction plus the label of the project it was booked against.
fn labelled_transaction(tx: &Transaction, labels: &HashMap<ProjectId, &str>) -> Value {
    let mut value = transaction_to_json(tx);
    let label = tx
        .project_id
        .and_then(|id| labels.get(&id).copied())
        .unwrap_or(GENERAL_LABEL);
    value["project"] = json!(label);
    value
}

pub fn line_to_json(line: &LedgerLine) -> Value {
    let mut value = transaction_to_json(&line.transaction);
    value["running_balance"] = json!(line.running_balance);
    value
}

pub fn totals_to_json(totals: &Totals) -> Value {
    json!({
        "income": totals.income,
        "expense": totals.expense,
        "net": totals.net(),
    })
}

pub fn finance_to_json(finance: &ProjectFinance) -> Value {
    json!({
        "project_id": finance.project_id.to_string(),
        "name": finance.name,
        "client": finance.client,
        "budget": finance.budget,
        "collected": finance.collected,
        "spent": finance.spent,
        "collection_percentage": finance.collection_percentage,
        "profitability": finance.profitability(),
    })
}

fn group_to_json(group: &ClientGroup) -> Value {
    json!({
        "title": group.title,
        "projects": group.projects.iter().map(finance_to_json).collect::<Vec<_>>(),
    })
}

fn balances_to_json(balances: &CompanyBalances) -> Value {
    json!({
        "totals": totals_to_json(&balances.totals),
        "groups": balances.groups.iter().map(group_to_json).collect::<Vec<_>>(),
        "chart": balances
            .chart
            .iter()
            .map(|p| json!({ "name": p.name, "collected": p.collected, "spent": p.spent }))
            .collect::<Vec<_>>(),
    })
}

pub fn dashboard_to_json(dashboard: &CompanyDashboard) -> Value {
    let labels: HashMap<ProjectId, &str> = dashboard
        .projects
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();

    json!({
        "company": company_to_json(&dashboard.company),
        "projects": dashboard.projects.iter().map(project_to_json).collect::<Vec<_>>(),
        "transactions": dashboard
            .recent
            .iter()
            .map(|tx| labelled_transaction(tx, &labels))
            .collect::<Vec<_>>(),
        "balances": dashboard.balances.as_ref().map(balances_to_json),
    })
}

pub fn project_detail_to_json(detail: &ProjectDetail) -> Value {
    json!({
        "company": company_to_json(&detail.company),
        "project": project_to_json(&detail.project),
        "transactions": detail.lines.iter().map(line_to_json).collect::<Vec<_>>(),
        "finance": detail.finance.as_ref().map(finance_to_json),
    })
}

pub fn me_to_json(me: &Me) -> Value {
    json!({
        "email": me.principal.identity.email().as_str(),
        "role": me.principal.role,
        "companies": me.companies.iter().map(company_to_json).collect::<Vec<_>>(),
    })
}

pub fn grant_to_json(grant: &AccessGrant) -> Value {
    json!({
        "id": grant.id.to_string(),
        "email": grant.email.as_str(),
        "company_id": grant.company_id.to_string(),
        "created_at": grant.created_at.to_rfc3339(),
    })
}

pub fn grant_listing_to_json(listing: &GrantListing) -> Value {
    let mut value = grant_to_json(&listing.grant);
    value["company_name"] = json!(listing.company_name);
    value
}

pub fn project_listing_to_json(listing: &ProjectListing) -> Value {
    let mut value = project_to_json(&listing.project);
    value["company_name"] = json!(listing.company_name);
    value
}
