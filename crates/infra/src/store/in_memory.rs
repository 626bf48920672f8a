use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use obraledger_auth::{AccessGrant, Email};
use obraledger_core::{CompanyId, GrantId, ProjectId, TransactionId};
use obraledger_ledger::{Company, Project, Transaction, TransactionQuery};

use super::{DeletedEntity, DeletionReceipt, LedgerStore, RemovedRows, StoreError};

#[derive(Debug, Default)]
struct Tables {
    companies: Vec<Company>,
    projects: Vec<Project>,
    /// Insertion order doubles as the tie-breaker for equal dates.
    transactions: Vec<Transaction>,
    grants: Vec<AccessGrant>,
}

/// In-memory ledger store for tests/dev.
///
/// All tables sit behind one lock, so cascades are atomic with respect to
/// every other operation.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

/// Remove every row matching `pred`, returning how many went.
fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|r| !pred(r));
    (before - rows.len()) as u64
}

/// Order by `(name, id)`, matching `ORDER BY name, id` on Postgres.
fn sorted_by_name<T, K: Ord>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> (&str, K)) -> Vec<T> {
    let mut out: Vec<T> = rows.collect();
    out.sort_by(|a, b| key(a).cmp(&key(b)));
    out
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut t = self.write()?;
        if t.companies.iter().any(|c| c.id == company.id) {
            return Err(StoreError::Constraint(format!("company {} already exists", company.id)));
        }
        t.companies.push(company.clone());
        Ok(company)
    }

    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.read()?.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        let t = self.read()?;
        Ok(sorted_by_name(t.companies.iter().cloned(), |c| (c.name.as_str(), c.id)))
    }

    async fn delete_company(&self, id: CompanyId) -> Result<Option<DeletionReceipt>, StoreError> {
        let mut t = self.write()?;
        let Some(pos) = t.companies.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let removed = RemovedRows {
            transactions: remove_where(&mut t.transactions, |tx| tx.company_id == id),
            projects: remove_where(&mut t.projects, |p| p.company_id == id),
            grants: remove_where(&mut t.grants, |g| g.company_id == id),
            companies: 1,
        };
        let company = t.companies.remove(pos);

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Company,
            id: *company.id.as_uuid(),
            label: company.name,
            removed,
        }))
    }

    async fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        let mut t = self.write()?;
        if !t.companies.iter().any(|c| c.id == project.company_id) {
            return Err(StoreError::Constraint(format!(
                "company {} does not exist",
                project.company_id
            )));
        }
        if t.projects.iter().any(|p| p.id == project.id) {
            return Err(StoreError::Constraint(format!("project {} already exists", project.id)));
        }
        t.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> Result<Option<Project>, StoreError> {
        let mut t = self.write()?;
        match t.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) if existing.company_id != project.company_id => Err(StoreError::Constraint(
                format!("project {} cannot move between companies", project.id),
            )),
            Some(existing) => {
                *existing = project.clone();
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn projects(&self, company_id: Option<CompanyId>) -> Result<Vec<Project>, StoreError> {
        let t = self.read()?;
        let rows = t
            .projects
            .iter()
            .filter(|p| company_id.is_none_or(|c| p.company_id == c))
            .cloned();
        Ok(sorted_by_name(rows, |p| (p.name.as_str(), p.id)))
    }

    async fn delete_project(&self, id: ProjectId) -> Result<Option<DeletionReceipt>, StoreError> {
        let mut t = self.write()?;
        let Some(pos) = t.projects.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let transactions = remove_where(&mut t.transactions, |tx| tx.project_id == Some(id));
        let project = t.projects.remove(pos);

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Project,
            id: *project.id.as_uuid(),
            label: project.name,
            removed: RemovedRows {
                projects: 1,
                transactions,
                ..RemovedRows::default()
            },
        }))
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        let mut t = self.write()?;
        if !t.companies.iter().any(|c| c.id == tx.company_id) {
            return Err(StoreError::Constraint(format!("company {} does not exist", tx.company_id)));
        }
        if let Some(pid) = tx.project_id {
            if !t.projects.iter().any(|p| p.id == pid) {
                return Err(StoreError::Constraint(format!("project {pid} does not exist")));
            }
        }
        t.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.read()?.transactions.iter().find(|tx| tx.id == id).cloned())
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError> {
        let mut rows: Vec<Transaction> = self
            .read()?
            .transactions
            .iter()
            .filter(|tx| query.matches(tx))
            .cloned()
            .collect();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<Option<DeletionReceipt>, StoreError> {
        let mut t = self.write()?;
        let Some(pos) = t.transactions.iter().position(|tx| tx.id == id) else {
            return Ok(None);
        };
        let tx = t.transactions.remove(pos);

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Transaction,
            id: *tx.id.as_uuid(),
            label: tx.description,
            removed: RemovedRows {
                transactions: 1,
                ..RemovedRows::default()
            },
        }))
    }

    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError> {
        let mut t = self.write()?;
        if let Some(existing) = t.grants.iter().find(|g| g.covers(&grant.email, grant.company_id)) {
            return Ok(existing.clone());
        }
        if !t.companies.iter().any(|c| c.id == grant.company_id) {
            return Err(StoreError::Constraint(format!(
                "company {} does not exist",
                grant.company_id
            )));
        }
        t.grants.push(grant.clone());
        Ok(grant)
    }

    async fn grants_for(&self, email: &Email) -> Result<Vec<AccessGrant>, StoreError> {
        Ok(self
            .read()?
            .grants
            .iter()
            .filter(|g| &g.email == email)
            .cloned()
            .collect())
    }

    async fn grants(&self) -> Result<Vec<AccessGrant>, StoreError> {
        let mut rows = self.read()?.grants.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete_grant(&self, id: GrantId) -> Result<Option<DeletionReceipt>, StoreError> {
        let mut t = self.write()?;
        let Some(pos) = t.grants.iter().position(|g| g.id == id) else {
            return Ok(None);
        };
        let grant = t.grants.remove(pos);

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Grant,
            id: *grant.id.as_uuid(),
            label: grant.email.to_string(),
            removed: RemovedRows {
                grants: 1,
                ..RemovedRows::default()
            },
        }))
    }
}
