use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use obraledger_core::{DomainResult, ProjectId};
use obraledger_ledger::{
    Company, LedgerLine, LedgerSummary, Project, Transaction, TransactionKind, aggregate, chronological,
};

use crate::document::{
    GENERAL_LABEL, ReportDocument, ReportFigures, ReportHeader, ReportRow, ReportScope, ReportSummary,
    SIGNATURE_LINES,
};

/// Executive report over `transactions` of `company`.
///
/// `projects` only supplies row labels; rows whose project is not listed are
/// labelled [`GENERAL_LABEL`].
pub fn compose_company_report(
    company: &Company,
    projects: &[Project],
    transactions: Vec<Transaction>,
    figures: ReportFigures,
    generated_at: DateTime<Utc>,
) -> DomainResult<ReportDocument> {
    let labels: HashMap<ProjectId, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();
    let summary = aggregate(&chronological(transactions), &[])?;

    let rows = summary
        .lines
        .iter()
        .map(|line| {
            let label = line
                .transaction
                .project_id
                .and_then(|id| labels.get(&id).copied())
                .unwrap_or(GENERAL_LABEL);
            row(line, label, figures)
        })
        .collect();

    Ok(ReportDocument {
        scope: ReportScope::Company { company_id: company.id },
        title: "Executive financial report".to_string(),
        figures,
        header: ReportHeader {
            company_name: company.name.clone(),
            project_name: None,
            client: None,
            budget: None,
            issued_on: generated_at.date_naive(),
        },
        summary: summary_block(&summary, figures, None),
        rows,
        signatures: signatures(),
        generated_at,
    })
}

/// Report over the transactions booked against `project`.
pub fn compose_project_report(
    company: &Company,
    project: &Project,
    transactions: Vec<Transaction>,
    figures: ReportFigures,
    generated_at: DateTime<Utc>,
) -> DomainResult<ReportDocument> {
    let transactions: Vec<Transaction> = chronological(transactions)
        .into_iter()
        .filter(|t| t.project_id == Some(project.id))
        .collect();
    let summary = aggregate(&transactions, std::slice::from_ref(project))?;
    let collection_percentage = summary.project(project.id).map(|f| f.collection_percentage);

    let rows = summary.lines.iter().map(|line| row(line, &project.name, figures)).collect();

    Ok(ReportDocument {
        scope: ReportScope::Project {
            company_id: company.id,
            project_id: project.id,
        },
        title: "Project financial report".to_string(),
        figures,
        header: ReportHeader {
            company_name: company.name.clone(),
            project_name: Some(project.name.clone()),
            client: project.client.clone(),
            budget: Some(project.budget),
            issued_on: generated_at.date_naive(),
        },
        summary: summary_block(&summary, figures, collection_percentage),
        rows,
        signatures: signatures(),
        generated_at,
    })
}

fn summary_block(
    summary: &LedgerSummary,
    figures: ReportFigures,
    collection_percentage: Option<Decimal>,
) -> Option<ReportSummary> {
    figures.includes_balances().then(|| ReportSummary {
        income: summary.totals.income,
        expense: summary.totals.expense,
        balance: summary.totals.net(),
        collection_percentage,
    })
}

fn row(line: &LedgerLine, project_label: &str, figures: ReportFigures) -> ReportRow {
    let tx = &line.transaction;
    let (charge, credit) = match tx.kind {
        TransactionKind::Expense => (Some(tx.amount.value()), None),
        TransactionKind::Income => (None, Some(tx.amount.value())),
    };

    ReportRow {
        date: tx.date,
        project: project_label.to_string(),
        description: tx.description.clone(),
        notes: tx.notes.clone(),
        charge,
        credit,
        balance: figures.includes_balances().then_some(line.running_balance),
    }
}

fn signatures() -> Vec<String> {
    SIGNATURE_LINES.iter().map(|s| s.to_string()).collect()
}
