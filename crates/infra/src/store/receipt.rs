use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedEntity {
    Company,
    Project,
    Transaction,
    Grant,
}

/// Row counts removed by one delete, cascades included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovedRows {
    pub companies: u64,
    pub projects: u64,
    pub transactions: u64,
    pub grants: u64,
}

impl RemovedRows {
    pub fn total(&self) -> u64 {
        self.companies + self.projects + self.transactions + self.grants
    }
}

/// Returned by every delete instead of the (now gone) entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReceipt {
    pub entity: DeletedEntity,
    pub id: Uuid,
    /// Human label of the removed root (company name, project name, ...).
    pub label: String,
    pub removed: RemovedRows,
}
