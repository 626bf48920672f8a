//! Transaction query shared by every store backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use obraledger_core::{CompanyId, ProjectId};

use crate::Transaction;

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrder {
    /// By business date ascending; equal dates keep insertion order.
    #[default]
    Chronological,
    /// By creation timestamp descending (activity feed).
    NewestFirst,
}

/// Filter criteria for transaction queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub company_id: Option<CompanyId>,
    pub project_id: Option<ProjectId>,
    /// Only rows with `created_at >= created_since`.
    pub created_since: Option<DateTime<Utc>>,
    pub order: TransactionOrder,
}

impl TransactionQuery {
    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Default::default()
        }
    }

    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn ordered(mut self, order: TransactionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn created_since(mut self, cutoff: Option<DateTime<Utc>>) -> Self {
        self.created_since = cutoff;
        self
    }

    /// Row-level predicate (ordering is applied separately).
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.company_id.is_none_or(|c| tx.company_id == c)
            && self.project_id.is_none_or(|p| tx.project_id == Some(p))
            && self.created_since.is_none_or(|cutoff| tx.created_at >= cutoff)
    }

    /// Order `rows` in place. Sorting is stable, so rows already in insertion
    /// order keep it for equal keys.
    pub fn sort(&self, rows: &mut [Transaction]) {
        match self.order {
            TransactionOrder::Chronological => rows.sort_by_key(|t| t.date),
            TransactionOrder::NewestFirst => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}
