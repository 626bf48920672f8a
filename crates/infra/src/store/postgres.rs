//! Postgres-backed ledger store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (foreign key / check / unique) | `23503` / `23514` / `23505` | `Constraint` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed, PoolTimedOut, Io, Tls | n/a | `Unavailable` |
//! | Column decode | n/a | `Corrupt` |
//!
//! Company and project deletes run inside one SQL transaction: dependants are
//! removed first, children before parents, and the counts are collected from
//! the affected rows of each statement.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use obraledger_auth::{AccessGrant, Email};
use obraledger_core::{CompanyId, GrantId, ProjectId, TransactionId};
use obraledger_ledger::{Amount, Company, Project, Transaction, TransactionOrder, TransactionQuery};

use super::{DeletedEntity, DeletionReceipt, LedgerStore, RemovedRows, StoreError};

const SCHEMA: &str = include_str!("../../schema.sql");

const TRANSACTION_COLUMNS: &str =
    "id, company_id, project_id, kind, amount, date, description, notes, evidence_url, created_at";

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables and indexes if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") | Some("23505") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
}

fn company_from_row(row: &PgRow) -> Result<Company, StoreError> {
    Ok(Company {
        id: CompanyId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
    })
}

fn project_from_row(row: &PgRow) -> Result<Project, StoreError> {
    Ok(Project {
        id: ProjectId::from_uuid(column(row, "id")?),
        company_id: CompanyId::from_uuid(column(row, "company_id")?),
        name: column(row, "name")?,
        client: column(row, "client")?,
        budget: column(row, "budget")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    let kind: String = column(row, "kind")?;
    let amount: Decimal = column(row, "amount")?;
    let project_id: Option<Uuid> = column(row, "project_id")?;
    let date: NaiveDate = column(row, "date")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Ok(Transaction {
        id: TransactionId::from_uuid(column(row, "id")?),
        company_id: CompanyId::from_uuid(column(row, "company_id")?),
        project_id: project_id.map(ProjectId::from_uuid),
        kind: kind.parse().map_err(|e| StoreError::Corrupt(format!("kind: {e}")))?,
        amount: Amount::new(amount).map_err(|e| StoreError::Corrupt(format!("amount: {e}")))?,
        date,
        description: column(row, "description")?,
        notes: column(row, "notes")?,
        evidence_url: column(row, "evidence_url")?,
        created_at,
    })
}

fn grant_from_row(row: &PgRow) -> Result<AccessGrant, StoreError> {
    let email: String = column(row, "email")?;
    Ok(AccessGrant {
        id: GrantId::from_uuid(column(row, "id")?),
        email: Email::parse(&email).map_err(|e| StoreError::Corrupt(format!("email: {e}")))?,
        company_id: CompanyId::from_uuid(column(row, "company_id")?),
        created_at: column(row, "created_at")?,
    })
}

fn order_clause(order: TransactionOrder) -> &'static str {
    match order {
        TransactionOrder::Chronological => "ORDER BY date ASC, seq ASC",
        TransactionOrder::NewestFirst => "ORDER BY created_at DESC, seq ASC",
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        sqlx::query("INSERT INTO companies (id, name) VALUES ($1, $2)")
            .bind(*company.id.as_uuid())
            .bind(&company.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(company)
    }

    async fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM companies WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("company", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM companies ORDER BY name, id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("companies", e))?;
        rows.iter().map(company_from_row).collect()
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn delete_company(&self, id: CompanyId) -> Result<Option<DeletionReceipt>, StoreError> {
        let uuid = *id.as_uuid();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let locked = sqlx::query("SELECT id, name FROM companies WHERE id = $1 FOR UPDATE")
            .bind(uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_company", e))?;
        let Some(row) = locked else {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };
        let company = company_from_row(&row)?;

        let transactions = sqlx::query("DELETE FROM transactions WHERE company_id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_company_transactions", e))?
            .rows_affected();
        let projects = sqlx::query("DELETE FROM projects WHERE company_id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_company_projects", e))?
            .rows_affected();
        let grants = sqlx::query("DELETE FROM access_grants WHERE company_id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_company_grants", e))?
            .rows_affected();
        let companies = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_company", e))?
            .rows_affected();

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Company,
            id: uuid,
            label: company.name,
            removed: RemovedRows {
                companies,
                projects,
                transactions,
                grants,
            },
        }))
    }

    #[instrument(skip(self, project), fields(project_id = %project.id), err)]
    async fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        sqlx::query(
            "INSERT INTO projects (id, company_id, name, client, budget) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*project.id.as_uuid())
        .bind(*project.company_id.as_uuid())
        .bind(&project.name)
        .bind(project.client.as_deref())
        .bind(project.budget)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_project", e))?;
        Ok(project)
    }

    #[instrument(skip(self, project), fields(project_id = %project.id), err)]
    async fn update_project(&self, project: Project) -> Result<Option<Project>, StoreError> {
        let affected = sqlx::query(
            "UPDATE projects SET name = $3, client = $4, budget = $5 WHERE id = $1 AND company_id = $2",
        )
        .bind(*project.id.as_uuid())
        .bind(*project.company_id.as_uuid())
        .bind(&project.name)
        .bind(project.client.as_deref())
        .bind(project.budget)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_project", e))?
        .rows_affected();

        Ok((affected > 0).then_some(project))
    }

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query("SELECT id, company_id, name, client, budget FROM projects WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("project", e))?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn projects(&self, company_id: Option<CompanyId>) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, client, budget
            FROM projects
            WHERE ($1::uuid IS NULL OR company_id = $1)
            ORDER BY name, id
            "#,
        )
        .bind(company_id.map(|c| *c.as_uuid()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("projects", e))?;
        rows.iter().map(project_from_row).collect()
    }

    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn delete_project(&self, id: ProjectId) -> Result<Option<DeletionReceipt>, StoreError> {
        let uuid = *id.as_uuid();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let locked = sqlx::query(
            "SELECT id, company_id, name, client, budget FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(uuid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_project", e))?;
        let Some(row) = locked else {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };
        let project = project_from_row(&row)?;

        let transactions = sqlx::query("DELETE FROM transactions WHERE project_id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_project_transactions", e))?
            .rows_affected();
        let projects = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_project", e))?
            .rows_affected();

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;

        Ok(Some(DeletionReceipt {
            entity: DeletedEntity::Project,
            id: uuid,
            label: project.name,
            removed: RemovedRows {
                projects,
                transactions,
                ..RemovedRows::default()
            },
        }))
    }

    #[instrument(skip(self, tx), fields(transaction_id = %tx.id), err)]
    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, company_id, project_id, kind, amount, date, description, notes, evidence_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*tx.id.as_uuid())
        .bind(*tx.company_id.as_uuid())
        .bind(tx.project_id.map(|p| *p.as_uuid()))
        .bind(tx.kind.as_str())
        .bind(tx.amount.value())
        .bind(tx.date)
        .bind(&tx.description)
        .bind(tx.notes.as_deref())
        .bind(tx.evidence_url.as_deref())
        .bind(tx.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_transaction", e))?;
        Ok(tx)
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("transaction", e))?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE ($1::uuid IS NULL OR company_id = $1)
                AND ($2::uuid IS NULL OR project_id = $2)
                AND ($3::timestamptz IS NULL OR created_at >= $3)
            {}
            "#,
            order_clause(query.order)
        );

        let rows = sqlx::query(&sql)
            .bind(query.company_id.map(|c| *c.as_uuid()))
            .bind(query.project_id.map(|p| *p.as_uuid()))
            .bind(query.created_since)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("transactions", e))?;
        rows.iter().map(transaction_from_row).collect()
    }

    #[instrument(skip(self), fields(transaction_id = %id), err)]
    async fn delete_transaction(&self, id: TransactionId) -> Result<Option<DeletionReceipt>, StoreError> {
        let row = sqlx::query("DELETE FROM transactions WHERE id = $1 RETURNING id, description")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_transaction", e))?;

        row.map(|row| -> Result<DeletionReceipt, StoreError> {
            Ok(DeletionReceipt {
                entity: DeletedEntity::Transaction,
                id: column(&row, "id")?,
                label: column(&row, "description")?,
                removed: RemovedRows {
                    transactions: 1,
                    ..RemovedRows::default()
                },
            })
        })
        .transpose()
    }

    #[instrument(skip(self, grant), fields(company_id = %grant.company_id), err)]
    async fn insert_grant(&self, grant: AccessGrant) -> Result<AccessGrant, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO access_grants (id, email, company_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email, company_id) DO NOTHING
            RETURNING id, email, company_id, created_at
            "#,
        )
        .bind(*grant.id.as_uuid())
        .bind(grant.email.as_str())
        .bind(*grant.company_id.as_uuid())
        .bind(grant.created_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_grant", e))?;

        if let Some(row) = inserted {
            return grant_from_row(&row);
        }

        let existing = sqlx::query(
            "SELECT id, email, company_id, created_at FROM access_grants WHERE email = $1 AND company_id = $2",
        )
        .bind(grant.email.as_str())
        .bind(*grant.company_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("existing_grant", e))?;
        grant_from_row(&existing)
    }

    async fn grants_for(&self, email: &Email) -> Result<Vec<AccessGrant>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, email, company_id, created_at FROM access_grants WHERE email = $1 ORDER BY created_at",
        )
        .bind(email.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("grants_for", e))?;
        rows.iter().map(grant_from_row).collect()
    }

    async fn grants(&self) -> Result<Vec<AccessGrant>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, email, company_id, created_at FROM access_grants ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("grants", e))?;
        rows.iter().map(grant_from_row).collect()
    }

    #[instrument(skip(self), fields(grant_id = %id), err)]
    async fn delete_grant(&self, id: GrantId) -> Result<Option<DeletionReceipt>, StoreError> {
        let row = sqlx::query("DELETE FROM access_grants WHERE id = $1 RETURNING id, email")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_grant", e))?;

        row.map(|row| -> Result<DeletionReceipt, StoreError> {
            Ok(DeletionReceipt {
                entity: DeletedEntity::Grant,
                id: column(&row, "id")?,
                label: column(&row, "email")?,
                removed: RemovedRows {
                    grants: 1,
                    ..RemovedRows::default()
                },
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use obraledger_auth::GrantAccess;
    use obraledger_ledger::{CreateCompany, CreateProject, RecordTransaction, TransactionKind};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn chronological_order_breaks_ties_by_insertion() {
        assert_eq!(order_clause(TransactionOrder::Chronological), "ORDER BY date ASC, seq ASC");
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(map_sqlx_error("x", sqlx::Error::PoolClosed), StoreError::Unavailable(_)));
        assert!(matches!(map_sqlx_error("x", sqlx::Error::PoolTimedOut), StoreError::Unavailable(_)));
    }

    /// Runs against a live database when `OBRALEDGER_TEST_DATABASE_URL` is set.
    #[tokio::test]
    #[ignore = "requires a Postgres database"]
    async fn cascade_delete_against_postgres() {
        let Ok(url) = std::env::var("OBRALEDGER_TEST_DATABASE_URL") else {
            return;
        };
        let store = PostgresLedgerStore::connect(&url).await.unwrap();
        store.ensure_schema().await.unwrap();

        let company = store
            .insert_company(CreateCompany { name: "Acme".into() }.into_company(CompanyId::new()).unwrap())
            .await
            .unwrap();
        let project = store
            .insert_project(
                CreateProject {
                    company_id: company.id,
                    name: "Bridge".into(),
                    client: None,
                    budget: dec!(100000),
                }
                .into_project(ProjectId::new())
                .unwrap(),
            )
            .await
            .unwrap();
        let tx = RecordTransaction {
            company_id: company.id,
            project_id: Some(project.id),
            kind: TransactionKind::Income,
            amount: dec!(40000),
            date: Utc::now().date_naive(),
            description: "Advance".into(),
            notes: None,
            evidence_url: None,
        }
        .into_transaction(Some(&project), TransactionId::new(), Utc::now())
        .unwrap();
        store.insert_transaction(tx).await.unwrap();

        let grant = GrantAccess { email: "ana@acme.test".into(), company_id: company.id }
            .into_grant(GrantId::new(), Utc::now())
            .unwrap();
        let first = store.insert_grant(grant.clone()).await.unwrap();
        let again = store
            .insert_grant(AccessGrant { id: GrantId::new(), ..grant })
            .await
            .unwrap();
        assert_eq!(first.id, again.id);

        let receipt = store.delete_company(company.id).await.unwrap().unwrap();
        assert_eq!(
            receipt.removed,
            RemovedRows { companies: 1, projects: 1, transactions: 1, grants: 1 }
        );
    }
}
