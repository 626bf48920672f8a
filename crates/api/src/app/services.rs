//! Application services: store wiring plus the ledger operations the routes call.
//!
//! Every operation takes the request principal and authorizes before touching
//! the store. Commands return the stored entity (or a deletion receipt).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use obraledger_auth::{
    AccessError, AccessGrant, AccessPolicy, AccessResolver, AuthzError, Capability, GrantAccess, Identity,
    Principal, Resource, RolePolicy, authorize,
};
use obraledger_core::{CompanyId, DomainError, GrantId, ProjectId, TransactionId};
use obraledger_infra::{
    AppConfig, DeletionReceipt, InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, StoreError,
};
use obraledger_ledger::{
    ClientGroup, Company, CreateCompany, CreateProject, LedgerLine, LedgerSummary, Project, ProjectFinance,
    RecordTransaction, Totals, Transaction, TransactionOrder, TransactionQuery, UpdateBudget, VisibilityWindow,
    aggregate, group_by_client,
};
use obraledger_observability::AUDIT_TARGET;
use obraledger_reports::{ReportDocument, ReportFigures, compose_company_report, compose_project_report};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} not found")]
    NotFound(&'static str),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Company figures only principals holding `ViewBalances` receive.
#[derive(Debug, Clone)]
pub struct CompanyBalances {
    pub totals: Totals,
    /// Projects grouped by normalised client name.
    pub groups: Vec<ClientGroup>,
    /// Projects with any income or expense, in name order.
    pub chart: Vec<ProjectFinance>,
}

#[derive(Debug, Clone)]
pub struct CompanyDashboard {
    pub company: Company,
    pub projects: Vec<Project>,
    /// Newest first; windowed for employees.
    pub recent: Vec<Transaction>,
    pub balances: Option<CompanyBalances>,
}

#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub company: Company,
    pub project: Project,
    /// Chronological rows visible to the principal, with running balance.
    pub lines: Vec<LedgerLine>,
    pub finance: Option<ProjectFinance>,
}

#[derive(Debug, Clone)]
pub struct Me {
    pub principal: Principal,
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone)]
pub struct ProjectListing {
    pub project: Project,
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct GrantListing {
    pub grant: AccessGrant,
    pub company_name: String,
}

/// Outcome of an idempotent grant.
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub grant: AccessGrant,
    pub created: bool,
}

pub struct AppServices {
    store: Arc<dyn LedgerStore>,
    resolver: AccessResolver,
    policy: Arc<dyn AccessPolicy>,
    window: VisibilityWindow,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerStore>, config: &AppConfig) -> Self {
        Self {
            store,
            resolver: AccessResolver::new(config.admin_emails.iter().cloned()),
            policy: Arc::new(RolePolicy),
            window: config.window,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    fn authorize(&self, principal: &Principal, resource: Resource, capability: Capability) -> ServiceResult<()> {
        authorize(self.policy.as_ref(), principal, &resource, capability)?;
        Ok(())
    }

    fn allows(&self, principal: &Principal, resource: Resource, capability: Capability) -> bool {
        self.policy.allows(principal, &resource, capability)
    }

    async fn load_company(&self, id: CompanyId) -> ServiceResult<Company> {
        self.store.company(id).await?.ok_or(ServiceError::NotFound("company"))
    }

    async fn load_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.store.project(id).await?.ok_or(ServiceError::NotFound("project"))
    }

    async fn company_names(&self) -> ServiceResult<HashMap<CompanyId, String>> {
        Ok(self
            .store
            .companies()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }

    fn audit(&self, principal: &Principal, receipt: &DeletionReceipt) {
        tracing::info!(
            target: AUDIT_TARGET,
            actor = %principal.identity.email(),
            entity = ?receipt.entity,
            id = %receipt.id,
            label = %receipt.label,
            companies = receipt.removed.companies,
            projects = receipt.removed.projects,
            transactions = receipt.removed.transactions,
            grants = receipt.removed.grants,
            "deleted"
        );
    }

    // -------------------------
    // Access
    // -------------------------

    /// Resolve the principal for an authenticated identity.
    ///
    /// Store failures surface as [`AccessError::Backend`]; they never widen scope.
    pub async fn resolve_principal(&self, identity: Identity) -> Result<Principal, AccessError> {
        if !self.resolver.requires_grant_lookup(&identity) {
            return Ok(self.resolver.resolve(identity, &[]));
        }

        let grants = self
            .store
            .grants_for(identity.email())
            .await
            .map_err(|e| AccessError::Backend(e.to_string()))?;
        Ok(self.resolver.resolve(identity, &grants))
    }

    pub async fn visible_companies(&self, principal: &Principal) -> ServiceResult<Vec<Company>> {
        if principal.scope.is_empty() {
            return Ok(Vec::new());
        }
        let companies = self.store.companies().await?;
        Ok(companies
            .into_iter()
            .filter(|c| principal.scope.contains(c.id))
            .collect())
    }

    pub async fn me(&self, principal: &Principal) -> ServiceResult<Me> {
        Ok(Me {
            principal: principal.clone(),
            companies: self.visible_companies(principal).await?,
        })
    }

    // -------------------------
    // Companies
    // -------------------------

    pub async fn create_company(&self, principal: &Principal, cmd: CreateCompany) -> ServiceResult<Company> {
        self.authorize(principal, Resource::Workspace, Capability::ManageLedger)?;
        let company = cmd.into_company(CompanyId::new())?;
        let company = self.store.insert_company(company).await?;
        tracing::info!(company_id = %company.id, "company created");
        Ok(company)
    }

    pub async fn company_dashboard(
        &self,
        principal: &Principal,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> ServiceResult<CompanyDashboard> {
        self.authorize(principal, Resource::Company(company_id), Capability::ViewCompany)?;
        let company = self.load_company(company_id).await?;
        let projects = self.store.projects(Some(company_id)).await?;

        let recent_query = self.window.restrict(
            principal.role,
            now,
            TransactionQuery::for_company(company_id).ordered(TransactionOrder::NewestFirst),
        );
        let recent = self.store.transactions(&recent_query).await?;

        let balances = if self.allows(principal, Resource::Company(company_id), Capability::ViewBalances) {
            let all = self.store.transactions(&TransactionQuery::for_company(company_id)).await?;
            let summary = aggregate(&all, &projects)?;
            Some(balances_from(summary))
        } else {
            None
        };

        Ok(CompanyDashboard {
            company,
            projects,
            recent,
            balances,
        })
    }

    pub async fn delete_company(&self, principal: &Principal, company_id: CompanyId) -> ServiceResult<DeletionReceipt> {
        self.authorize(principal, Resource::Company(company_id), Capability::ManageLedger)?;
        let receipt = self
            .store
            .delete_company(company_id)
            .await?
            .ok_or(ServiceError::NotFound("company"))?;
        self.audit(principal, &receipt);
        Ok(receipt)
    }

    // -------------------------
    // Projects
    // -------------------------

    pub async fn create_project(&self, principal: &Principal, cmd: CreateProject) -> ServiceResult<Project> {
        self.authorize(principal, Resource::Company(cmd.company_id), Capability::ManageLedger)?;
        self.load_company(cmd.company_id).await?;
        let project = cmd.into_project(ProjectId::new())?;
        let project = self.store.insert_project(project).await?;
        tracing::info!(project_id = %project.id, company_id = %project.company_id, "project created");
        Ok(project)
    }

    pub async fn project_detail(
        &self,
        principal: &Principal,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> ServiceResult<ProjectDetail> {
        let project = self.load_project(project_id).await?;
        let resource = Resource::Company(project.company_id);
        self.authorize(principal, resource, Capability::ViewCompany)?;
        let company = self.load_company(project.company_id).await?;

        let query = self
            .window
            .restrict(principal.role, now, TransactionQuery::for_project(project_id));
        let visible = self.store.transactions(&query).await?;
        let lines = aggregate(&visible, &[])?.lines;

        let finance = if self.allows(principal, resource, Capability::ViewBalances) {
            let all = self.store.transactions(&TransactionQuery::for_project(project_id)).await?;
            aggregate(&all, std::slice::from_ref(&project))?.project(project_id).cloned()
        } else {
            None
        };

        Ok(ProjectDetail {
            company,
            project,
            lines,
            finance,
        })
    }

    pub async fn update_budget(&self, principal: &Principal, cmd: UpdateBudget) -> ServiceResult<Project> {
        let project = self.load_project(cmd.project_id).await?;
        self.authorize(principal, Resource::Company(project.company_id), Capability::ManageLedger)?;
        let updated = cmd.apply_to(project)?;
        let stored = self
            .store
            .update_project(updated)
            .await?
            .ok_or(ServiceError::NotFound("project"))?;
        tracing::info!(project_id = %stored.id, budget = %stored.budget, "project budget updated");
        Ok(stored)
    }

    pub async fn delete_project(&self, principal: &Principal, project_id: ProjectId) -> ServiceResult<DeletionReceipt> {
        let project = self.load_project(project_id).await?;
        self.authorize(principal, Resource::Company(project.company_id), Capability::ManageLedger)?;
        let receipt = self
            .store
            .delete_project(project_id)
            .await?
            .ok_or(ServiceError::NotFound("project"))?;
        self.audit(principal, &receipt);
        Ok(receipt)
    }

    pub async fn all_projects(&self, principal: &Principal) -> ServiceResult<Vec<ProjectListing>> {
        self.authorize(principal, Resource::Workspace, Capability::ManageLedger)?;
        let names = self.company_names().await?;
        let projects = self.store.projects(None).await?;
        Ok(projects
            .into_iter()
            .map(|project| ProjectListing {
                company_name: names.get(&project.company_id).cloned().unwrap_or_default(),
                project,
            })
            .collect())
    }

    // -------------------------
    // Transactions
    // -------------------------

    pub async fn record_transaction(
        &self,
        principal: &Principal,
        cmd: RecordTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction> {
        self.authorize(principal, Resource::Company(cmd.company_id), Capability::RecordTransaction)?;
        self.load_company(cmd.company_id).await?;

        let project = match cmd.project_id {
            Some(id) => self.store.project(id).await?,
            None => None,
        };
        let tx = cmd.into_transaction(project.as_ref(), TransactionId::new(), now)?;
        let tx = self.store.insert_transaction(tx).await?;
        tracing::info!(
            transaction_id = %tx.id,
            company_id = %tx.company_id,
            kind = %tx.kind,
            amount = %tx.amount,
            "transaction recorded"
        );
        Ok(tx)
    }

    pub async fn delete_transaction(
        &self,
        principal: &Principal,
        transaction_id: TransactionId,
    ) -> ServiceResult<DeletionReceipt> {
        let tx = self
            .store
            .transaction(transaction_id)
            .await?
            .ok_or(ServiceError::NotFound("transaction"))?;
        self.authorize(principal, Resource::Company(tx.company_id), Capability::ManageLedger)?;
        let receipt = self
            .store
            .delete_transaction(transaction_id)
            .await?
            .ok_or(ServiceError::NotFound("transaction"))?;
        self.audit(principal, &receipt);
        Ok(receipt)
    }

    // -------------------------
    // Reports
    // -------------------------

    pub async fn company_report(
        &self,
        principal: &Principal,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> ServiceResult<ReportDocument> {
        let resource = Resource::Company(company_id);
        self.authorize(principal, resource, Capability::ViewCompany)?;
        let company = self.load_company(company_id).await?;
        let projects = self.store.projects(Some(company_id)).await?;

        let figures = self.report_figures(principal, resource);
        let query = self.report_query(principal, figures, now, TransactionQuery::for_company(company_id));
        let transactions = self.store.transactions(&query).await?;
        Ok(compose_company_report(&company, &projects, transactions, figures, now)?)
    }

    pub async fn project_report(
        &self,
        principal: &Principal,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> ServiceResult<ReportDocument> {
        let project = self.load_project(project_id).await?;
        let resource = Resource::Company(project.company_id);
        self.authorize(principal, resource, Capability::ViewCompany)?;
        let company = self.load_company(project.company_id).await?;

        let figures = self.report_figures(principal, resource);
        let query = self.report_query(principal, figures, now, TransactionQuery::for_project(project_id));
        let transactions = self.store.transactions(&query).await?;
        Ok(compose_project_report(&company, &project, transactions, figures, now)?)
    }

    /// Full figures need `ViewBalances`; everyone else gets the listing only.
    fn report_figures(&self, principal: &Principal, resource: Resource) -> ReportFigures {
        if self.allows(principal, resource, Capability::ViewBalances) {
            ReportFigures::Full
        } else {
            ReportFigures::ListingOnly
        }
    }

    /// Full reports cover the whole ledger; listings stay inside the visibility window.
    fn report_query(
        &self,
        principal: &Principal,
        figures: ReportFigures,
        now: DateTime<Utc>,
        query: TransactionQuery,
    ) -> TransactionQuery {
        match figures {
            ReportFigures::Full => query,
            ReportFigures::ListingOnly => self.window.restrict(principal.role, now, query),
        }
    }

    // -------------------------
    // Grants
    // -------------------------

    pub async fn grants(&self, principal: &Principal) -> ServiceResult<Vec<GrantListing>> {
        self.authorize(principal, Resource::Workspace, Capability::ManageGrants)?;
        let names = self.company_names().await?;
        let grants = self.store.grants().await?;
        Ok(grants
            .into_iter()
            .map(|grant| GrantListing {
                company_name: names.get(&grant.company_id).cloned().unwrap_or_default(),
                grant,
            })
            .collect())
    }

    pub async fn grant_access(
        &self,
        principal: &Principal,
        cmd: GrantAccess,
        now: DateTime<Utc>,
    ) -> ServiceResult<GrantOutcome> {
        self.authorize(principal, Resource::Workspace, Capability::ManageGrants)?;
        self.load_company(cmd.company_id).await?;

        let id = GrantId::new();
        let grant = cmd.into_grant(id, now)?;
        let stored = self.store.insert_grant(grant).await?;
        let created = stored.id == id;
        if created {
            tracing::info!(
                target: AUDIT_TARGET,
                actor = %principal.identity.email(),
                grantee = %stored.email,
                company_id = %stored.company_id,
                "access granted"
            );
        }
        Ok(GrantOutcome { grant: stored, created })
    }

    pub async fn revoke_access(&self, principal: &Principal, grant_id: GrantId) -> ServiceResult<DeletionReceipt> {
        self.authorize(principal, Resource::Workspace, Capability::ManageGrants)?;
        let receipt = self
            .store
            .delete_grant(grant_id)
            .await?
            .ok_or(ServiceError::NotFound("grant"))?;
        self.audit(principal, &receipt);
        Ok(receipt)
    }
}

fn balances_from(summary: LedgerSummary) -> CompanyBalances {
    let chart = summary
        .projects
        .iter()
        .filter(|p| p.has_activity())
        .cloned()
        .collect();

    CompanyBalances {
        totals: summary.totals,
        groups: group_by_client(summary.projects),
        chart,
    }
}

/// Build services for `config`: Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn LedgerStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresLedgerStore::connect(url).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres ledger store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory ledger store");
            Arc::new(InMemoryLedgerStore::new())
        }
    };
    Ok(AppServices::new(store, config))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use obraledger_auth::{Email, Role};
    use obraledger_ledger::TransactionKind;
    use rust_decimal::Decimal;

    use super::*;

    const ADMIN: &str = "boss@obra.test";

    fn services() -> AppServices {
        let config = AppConfig::for_tests("secret", vec![Email::parse(ADMIN).unwrap()]);
        AppServices::new(Arc::new(InMemoryLedgerStore::new()), &config)
    }

    async fn principal(svc: &AppServices, email: &str) -> Principal {
        svc.resolve_principal(Identity::new(Email::parse(email).unwrap()))
            .await
            .unwrap()
    }

    fn record(company_id: CompanyId, project_id: Option<ProjectId>, kind: TransactionKind, amount: i64) -> RecordTransaction {
        RecordTransaction {
            company_id,
            project_id,
            kind,
            amount: Decimal::from(amount),
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            description: "movement".to_string(),
            notes: None,
            evidence_url: None,
        }
    }

    #[tokio::test]
    async fn admin_dashboard_carries_balances_and_groups() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let bridge = svc
            .create_project(
                &admin,
                CreateProject {
                    company_id: acme.id,
                    name: "Bridge".into(),
                    client: Some(" muni norte".into()),
                    budget: Decimal::from(100_000),
                },
            )
            .await
            .unwrap();
        svc.create_project(
            &admin,
            CreateProject {
                company_id: acme.id,
                name: "Idle".into(),
                client: None,
                budget: Decimal::ZERO,
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        svc.record_transaction(&admin, record(acme.id, Some(bridge.id), TransactionKind::Income, 40_000), now)
            .await
            .unwrap();
        svc.record_transaction(&admin, record(acme.id, Some(bridge.id), TransactionKind::Expense, 10_000), now)
            .await
            .unwrap();

        let dashboard = svc.company_dashboard(&admin, acme.id, now).await.unwrap();
        let balances = dashboard.balances.unwrap();

        assert_eq!(balances.totals.net(), Decimal::from(30_000));
        let titles: Vec<_> = balances.groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, ["MUNI NORTE", "OTHERS"]);
        assert_eq!(balances.chart.len(), 1);
        assert_eq!(balances.chart[0].collection_percentage, Decimal::from(40));
        assert_eq!(dashboard.recent.len(), 2);
    }

    #[tokio::test]
    async fn employee_sees_windowed_rows_without_balances() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        svc.grant_access(
            &admin,
            GrantAccess { email: "ana@obra.test".into(), company_id: acme.id },
            Utc::now(),
        )
        .await
        .unwrap();

        let now = Utc::now();
        svc.record_transaction(&admin, record(acme.id, None, TransactionKind::Income, 5), now - Duration::hours(25))
            .await
            .unwrap();
        svc.record_transaction(&admin, record(acme.id, None, TransactionKind::Expense, 2), now - Duration::hours(1))
            .await
            .unwrap();

        let ana = principal(&svc, "ana@obra.test").await;
        assert_eq!(ana.role, Role::Employee);

        let dashboard = svc.company_dashboard(&ana, acme.id, now).await.unwrap();
        assert!(dashboard.balances.is_none());
        assert_eq!(dashboard.recent.len(), 1);
        assert_eq!(dashboard.recent[0].kind, TransactionKind::Expense);

        let admin_view = svc.company_dashboard(&admin, acme.id, now).await.unwrap();
        assert_eq!(admin_view.recent.len(), 2);
    }

    #[tokio::test]
    async fn employee_cannot_manage_or_leave_scope() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let other = svc.create_company(&admin, CreateCompany { name: "Other".into() }).await.unwrap();
        svc.grant_access(&admin, GrantAccess { email: "ana@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();
        let ana = principal(&svc, "ana@obra.test").await;

        let err = svc.delete_company(&ana, acme.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(Capability::ManageLedger))));

        let err = svc.company_dashboard(&ana, other.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::OutOfScope)));

        let tx = svc
            .record_transaction(&ana, record(acme.id, None, TransactionKind::Expense, 3), Utc::now())
            .await
            .unwrap();
        assert_eq!(tx.company_id, acme.id);

        let visible = svc.visible_companies(&ana).await.unwrap();
        assert_eq!(visible, vec![acme]);
    }

    #[tokio::test]
    async fn employee_without_grants_sees_nothing() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();

        let nobody = principal(&svc, "nobody@obra.test").await;
        assert!(nobody.scope.is_empty());
        assert!(svc.visible_companies(&nobody).await.unwrap().is_empty());
        assert_eq!(svc.visible_companies(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn grant_is_idempotent_and_revocable() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();

        let first = svc
            .grant_access(&admin, GrantAccess { email: "ana@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();
        let again = svc
            .grant_access(&admin, GrantAccess { email: "ANA@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();
        assert!(first.created);
        assert!(!again.created);
        assert_eq!(first.grant.id, again.grant.id);

        let listing = svc.grants(&admin).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].company_name, "Acme");

        let receipt = svc.revoke_access(&admin, first.grant.id).await.unwrap();
        assert_eq!(receipt.removed.grants, 1);
        assert!(principal(&svc, "ana@obra.test").await.scope.is_empty());
    }

    #[tokio::test]
    async fn transaction_on_foreign_project_is_rejected() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let other = svc.create_company(&admin, CreateCompany { name: "Other".into() }).await.unwrap();
        let foreign = svc
            .create_project(
                &admin,
                CreateProject {
                    company_id: other.id,
                    name: "Road".into(),
                    client: None,
                    budget: Decimal::ONE,
                },
            )
            .await
            .unwrap();

        let err = svc
            .record_transaction(&admin, record(acme.id, Some(foreign.id), TransactionKind::Income, 1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn project_detail_reports_finance_to_admins_only() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let bridge = svc
            .create_project(
                &admin,
                CreateProject {
                    company_id: acme.id,
                    name: "Bridge".into(),
                    client: None,
                    budget: Decimal::from(1_000),
                },
            )
            .await
            .unwrap();
        svc.record_transaction(&admin, record(acme.id, Some(bridge.id), TransactionKind::Income, 250), Utc::now())
            .await
            .unwrap();
        svc.grant_access(&admin, GrantAccess { email: "ana@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();

        let detail = svc.project_detail(&admin, bridge.id, Utc::now()).await.unwrap();
        assert_eq!(detail.finance.unwrap().collection_percentage, Decimal::from(25));
        assert_eq!(detail.lines.len(), 1);

        let ana = principal(&svc, "ana@obra.test").await;
        let detail = svc.project_detail(&ana, bridge.id, Utc::now()).await.unwrap();
        assert!(detail.finance.is_none());
        assert_eq!(detail.lines.len(), 1);

        let receipt = svc.delete_project(&admin, bridge.id).await.unwrap();
        assert_eq!(receipt.removed.transactions, 1);
        assert!(matches!(
            svc.project_detail(&admin, bridge.id, Utc::now()).await,
            Err(ServiceError::NotFound("project"))
        ));
    }

    async fn bridge(svc: &AppServices, admin: &Principal, company_id: CompanyId) -> Project {
        svc.create_project(
            admin,
            CreateProject {
                company_id,
                name: "Bridge".into(),
                client: None,
                budget: Decimal::from(100_000),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn employee_report_is_a_windowed_listing_without_figures() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let bridge = bridge(&svc, &admin, acme.id).await;
        svc.grant_access(&admin, GrantAccess { email: "ana@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();

        let now = Utc::now();
        svc.record_transaction(
            &admin,
            record(acme.id, Some(bridge.id), TransactionKind::Income, 40_000),
            now - Duration::hours(25),
        )
        .await
        .unwrap();
        svc.record_transaction(
            &admin,
            record(acme.id, Some(bridge.id), TransactionKind::Expense, 10_000),
            now - Duration::hours(1),
        )
        .await
        .unwrap();

        let ana = principal(&svc, "ana@obra.test").await;
        let report = svc.project_report(&ana, bridge.id, now).await.unwrap();
        assert_eq!(report.figures, ReportFigures::ListingOnly);
        assert!(report.summary.is_none());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].charge, Some(Decimal::from(10_000)));
        assert_eq!(report.rows[0].balance, None);

        let report = svc.company_report(&ana, acme.id, now).await.unwrap();
        assert!(report.summary.is_none());
        assert_eq!(report.rows.len(), 1);

        let report = svc.project_report(&admin, bridge.id, now).await.unwrap();
        let summary = report.summary.unwrap();
        assert_eq!(report.figures, ReportFigures::Full);
        assert_eq!(summary.balance, Decimal::from(30_000));
        assert_eq!(summary.collection_percentage, Some(Decimal::from(40)));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[1].balance, Some(Decimal::from(30_000)));
    }

    #[tokio::test]
    async fn budget_edit_is_admin_only_and_bounded() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let bridge = bridge(&svc, &admin, acme.id).await;
        svc.grant_access(&admin, GrantAccess { email: "ana@obra.test".into(), company_id: acme.id }, Utc::now())
            .await
            .unwrap();

        let updated = svc
            .update_budget(&admin, UpdateBudget { project_id: bridge.id, budget: Decimal::from(250_000) })
            .await
            .unwrap();
        assert_eq!(updated.budget, Decimal::from(250_000));
        assert_eq!(svc.store().project(bridge.id).await.unwrap().unwrap().budget, Decimal::from(250_000));

        let ana = principal(&svc, "ana@obra.test").await;
        let err = svc
            .update_budget(&ana, UpdateBudget { project_id: bridge.id, budget: Decimal::ONE })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(Capability::ManageLedger))));

        let err = svc
            .update_budget(&admin, UpdateBudget { project_id: bridge.id, budget: Decimal::MAX })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn oversized_amount_is_a_validation_error() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();

        let mut cmd = record(acme.id, None, TransactionKind::Income, 0);
        cmd.amount = Decimal::MAX;
        let err = svc.record_transaction(&admin, cmd, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(svc.company_dashboard(&admin, acme.id, Utc::now()).await.unwrap().recent.is_empty());
    }

    #[tokio::test]
    async fn all_projects_carry_company_names_for_admins() {
        let svc = services();
        let admin = principal(&svc, ADMIN).await;
        let acme = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap();
        let globex = svc.create_company(&admin, CreateCompany { name: "Globex".into() }).await.unwrap();
        bridge(&svc, &admin, acme.id).await;
        bridge(&svc, &admin, globex.id).await;

        let listing = svc.all_projects(&admin).await.unwrap();
        let mut names: Vec<_> = listing.iter().map(|l| l.company_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Acme", "Globex"]);

        let nobody = principal(&svc, "nobody@obra.test").await;
        let err = svc.all_projects(&nobody).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(_)));
    }

    struct ReadOnly;

    impl AccessPolicy for ReadOnly {
        fn check(&self, _: &Principal, _: &Resource, capability: Capability) -> Result<(), AuthzError> {
            match capability {
                Capability::ViewCompany => Ok(()),
                other => Err(AuthzError::Forbidden(other)),
            }
        }
    }

    #[tokio::test]
    async fn custom_policy_replaces_role_rules() {
        let svc = services().with_policy(Arc::new(ReadOnly));
        let admin = principal(&svc, ADMIN).await;

        let err = svc.create_company(&admin, CreateCompany { name: "Acme".into() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(Capability::ManageLedger))));
    }
}
