use std::sync::Arc;

use obraledger_auth::{AccessGrant, Email};
use obraledger_core::{CompanyId, GrantId, ProjectId, TransactionId};
use obraledger_ledger::{Company, Project, Transaction, TransactionQuery};

use super::{DeletionReceipt, StoreError};

/// Relational ledger persistence.
///
/// Every write is a single statement except the company and project deletes,
/// which cascade atomically and report what they removed. Deletes of missing
/// rows return `Ok(None)`.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    // companies
    async fn insert_company(&self, company: Company) -> Result<Company, StoreError>;
    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    /// All companies ordered by name.
    async fn companies(&self) -> Result<Vec<Company>, StoreError>;
    /// Removes the company with its projects, transactions and grants.
    async fn delete_company(&self, id: CompanyId) -> Result<Option<DeletionReceipt>, StoreError>;

    // projects
    async fn insert_project(&self, project: Project) -> Result<Project, StoreError>;
    async fn update_project(&self, project: Project) -> Result<Option<Project>, StoreError>;
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    /// Projects ordered by name; every company when `company_id` is `None`.
    async fn projects(&self, company_id: Option<CompanyId>) -> Result<Vec<Project>, StoreError>;
    /// Removes the project with the transactions booked against it.
    async fn delete_project(&self, id: ProjectId) -> Result<Option<DeletionReceipt>, StoreError>;

    // transactions
    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, StoreError>;
    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;
    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError>;
    async fn delete_transaction(&self, id: TransactionId) -> Result<Option<DeletionReceipt>, StoreError>;

    // grants
    /// Idempotent on (email, company): an existing grant is returned unchanged.
    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError>;
    async fn grants_for(&self, email: &Email) -> Result<Vec<AccessGrant>, StoreError>;
    /// All grants, newest first.
    async fn grants(&self) -> Result<Vec<AccessGrant>, StoreError>;
    async fn delete_grant(&self, id: GrantId) -> Result<Option<DeletionReceipt>, StoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        (**self).insert_company(company).await
    }

    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        (**self).company(id).await
    }

    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        (**self).companies().await
    }

    async fn delete_company(&self, id: CompanyId) -> Result<Option<DeletionReceipt>, StoreError> {
        (**self).delete_company(id).await
    }

    async fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        (**self).insert_project(project).await
    }

    async fn update_project(&self, project: Project) -> Result<Option<Project>, StoreError> {
        (**self).update_project(project).await
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        (**self).project(id).await
    }

    async fn projects(&self, company_id: Option<CompanyId>) -> Result<Vec<Project>, StoreError> {
        (**self).projects(company_id).await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<Option<DeletionReceipt>, StoreError> {
        (**self).delete_project(id).await
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        (**self).insert_transaction(tx).await
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        (**self).transaction(id).await
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError> {
        (**self).transactions(query).await
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<Option<DeletionReceipt>, StoreError> {
        (**self).delete_transaction(id).await
    }

    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError> {
        (**self).insert_grant(grant).await
    }

    async fn grants_for(&self, email: &Email) -> Result<Vec<AccessGrant>, StoreError> {
        (**self).grants_for(email).await
    }

    async fn grants(&self) -> Result<Vec<AccessGrant>, StoreError> {
        (**self).grants().await
    }

    async fn delete_grant(&self, id: GrantId) -> Result<Option<DeletionReceipt>, StoreError> {
        (**self).delete_grant(id).await
    }
}
