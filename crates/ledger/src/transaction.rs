use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use obraledger_core::{CompanyId, DomainError, DomainResult, Entity, ProjectId, TransactionId};

use crate::company::{optional, required};
use crate::{Amount, Project, TransactionKind};

/// A single income or expense ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub company_id: CompanyId,
    /// `None` books the entry against the company itself ("General").
    pub project_id: Option<ProjectId>,
    pub kind: TransactionKind,
    pub amount: Amount,
    /// Business date of the movement.
    pub date: NaiveDate,
    pub description: String,
    pub notes: Option<String>,
    /// Public URL of the uploaded evidence (receipt, invoice photo).
    pub evidence_url: Option<String>,
    /// When the row was recorded; drives the employee visibility window.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed contribution to a balance.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: RecordTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransaction {
    pub company_id: CompanyId,
    pub project_id: Option<ProjectId>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
}

impl RecordTransaction {
    /// Validate the command and build the transaction.
    ///
    /// `project` must be the project named by `project_id` as loaded by the
    /// caller (`None` when it does not exist).
    pub fn into_transaction(
        self,
        project: Option<&Project>,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        match (self.project_id, project) {
            (None, _) => {}
            (Some(_), None) => return Err(DomainError::not_found()),
            (Some(pid), Some(p)) if p.id != pid => {
                return Err(DomainError::invariant("loaded project does not match project_id"));
            }
            (Some(_), Some(p)) if p.company_id != self.company_id => {
                return Err(DomainError::invariant("project belongs to another company"));
            }
            (Some(_), Some(_)) => {}
        }

        let evidence_url = optional(self.evidence_url);
        if let Some(url) = &evidence_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(DomainError::validation("evidence_url must be an http(s) URL"));
            }
        }

        Ok(Transaction {
            id,
            company_id: self.company_id,
            project_id: self.project_id,
            kind: self.kind,
            amount: Amount::new(self.amount)?,
            date: self.date,
            description: required("description", &self.description)?,
            notes: optional(self.notes),
            evidence_url,
            created_at: now,
        })
    }
}
