use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use obraledger_auth::{Email, JwtClaims};
use obraledger_core::{CompanyId, ProjectId, TransactionId};
use obraledger_infra::{AppConfig, InMemoryLedgerStore, LedgerStore};
use obraledger_ledger::{RecordTransaction, TransactionKind};

const SECRET: &str = "test-secret";
const ADMIN: &str = "boss@obra.test";
const EMPLOYEE: &str = "crew@obra.test";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryLedgerStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let config = AppConfig::for_tests(SECRET, vec![Email::parse(ADMIN).unwrap()]);
        let store = Arc::new(InMemoryLedgerStore::new());
        let app = obraledger_api::app::build_app_with(&config, store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, store, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, email: &str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: format!("idp|{email}"),
        email: email.to_string(),
        iat: now,
        exp: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal encoded as string")).unwrap()
}

async fn post(client: &reqwest::Client, url: String, token: &str, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn get(client: &reqwest::Client, url: String, token: &str) -> (StatusCode, Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn seed_company(client: &reqwest::Client, srv: &TestServer, admin: &str, name: &str) -> String {
    let (status, body) = post(client, srv.url("/companies"), admin, json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/companies")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/companies"))
        .bearer_auth(mint_jwt("other-secret", ADMIN))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_reports_role_from_configured_administrators() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, srv.url("/me"), &mint_jwt(SECRET, ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADMIN);
    assert_eq!(body["role"], "admin");

    let (status, body) = get(&client, srv.url("/me"), &mint_jwt(SECRET, EMPLOYEE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "employee");
    assert!(body["companies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_dashboard_shows_project_finance() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    let (status, project) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/projects")),
        &admin,
        json!({ "name": "Bridge", "client": " city council ", "budget": "100000" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_str().unwrap().to_string();

    for (kind, amount, description) in [("INCOME", "40000", "Advance"), ("EXPENSE", "10000", "Steel")] {
        let (status, _) = post(
            &client,
            srv.url(&format!("/companies/{company_id}/transactions")),
            &admin,
            json!({
                "project_id": project_id,
                "kind": kind,
                "amount": amount,
                "date": "2024-03-01",
                "description": description,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(&client, srv.url(&format!("/companies/{company_id}")), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["transactions"][0]["project"], "Bridge");

    let balances = &body["balances"];
    assert_eq!(decimal(&balances["totals"]["net"]), Decimal::from(30_000));

    let group = &balances["groups"][0];
    assert_eq!(group["title"], "CITY COUNCIL");
    let finance = &group["projects"][0];
    assert_eq!(decimal(&finance["collected"]), Decimal::from(40_000));
    assert_eq!(decimal(&finance["spent"]), Decimal::from(10_000));
    assert_eq!(decimal(&finance["profitability"]), Decimal::from(30_000));
    assert_eq!(decimal(&finance["collection_percentage"]), Decimal::from(40));

    let (status, detail) = get(&client, srv.url(&format!("/projects/{project_id}")), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let lines = detail["transactions"].as_array().unwrap();
    assert_eq!(decimal(&lines[1]["running_balance"]), Decimal::from(30_000));
}

#[tokio::test]
async fn employee_sees_only_granted_companies() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);
    let employee = mint_jwt(SECRET, EMPLOYEE);

    let granted = seed_company(&client, &srv, &admin, "Acme").await;
    let hidden = seed_company(&client, &srv, &admin, "Globex").await;

    let (_, body) = get(&client, srv.url("/companies"), &employee).await;
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, _) = post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": granted }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": "CREW@obra.test", "company_id": granted }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "second grant for the same pair is a no-op");

    let (_, body) = get(&client, srv.url("/companies"), &employee).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], granted.as_str());

    let (status, body) = get(&client, srv.url(&format!("/companies/{hidden}")), &employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access_denied");

    let (status, _) = get(&client, srv.url("/admin/grants"), &employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn employee_records_but_cannot_delete_transactions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);
    let employee = mint_jwt(SECRET, EMPLOYEE);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": company_id }),
    )
    .await;

    let (status, tx) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/transactions")),
        &employee,
        json!({ "kind": "expense", "amount": "120.50", "description": "Cement" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(tx["project_id"].is_null());

    let (_, dashboard) = get(&client, srv.url(&format!("/companies/{company_id}")), &employee).await;
    assert!(dashboard["balances"].is_null());
    assert_eq!(dashboard["transactions"][0]["project"], "General");

    let res = client
        .delete(srv.url(&format!("/transactions/{}", tx["id"].as_str().unwrap())))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let (status, body) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/transactions")),
        &employee,
        json!({ "kind": "expense", "amount": "-5", "description": "Refund" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn employee_window_hides_old_transactions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);
    let employee = mint_jwt(SECRET, EMPLOYEE);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": company_id }),
    )
    .await;

    let now = Utc::now();
    for (hours, description) in [(25, "old"), (1, "recent")] {
        let tx = RecordTransaction {
            company_id: CompanyId::from_str(&company_id).unwrap(),
            project_id: None,
            kind: TransactionKind::Income,
            amount: Decimal::from(100),
            date: now.date_naive(),
            description: description.to_string(),
            notes: None,
            evidence_url: None,
        }
        .into_transaction(None, TransactionId::new(), now - ChronoDuration::hours(hours))
        .unwrap();
        srv.store.insert_transaction(tx).await.unwrap();
    }

    let (_, body) = get(&client, srv.url(&format!("/companies/{company_id}")), &employee).await;
    let rows = body["transactions"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["description"], "recent");

    let (_, body) = get(&client, srv.url(&format!("/companies/{company_id}")), &admin).await;
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn text_report_carries_signatures() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    post(
        &client,
        srv.url(&format!("/companies/{company_id}/transactions")),
        &admin,
        json!({ "kind": "INCOME", "amount": "2500", "description": "Deposit" }),
    )
    .await;

    let res = client
        .get(srv.url(&format!("/companies/{company_id}/report?format=text")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();
    assert!(text.contains("Acme"));
    assert!(text.contains("Deposit"));
    assert!(text.contains("Responsible signature"));
    assert!(text.contains("Audit signature"));

    let (status, doc) = get(&client, srv.url(&format!("/companies/{company_id}/report")), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_company_cascades_and_returns_receipt() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    let (_, project) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/projects")),
        &admin,
        json!({ "name": "Bridge", "budget": "1000" }),
    )
    .await;
    post(
        &client,
        srv.url(&format!("/companies/{company_id}/transactions")),
        &admin,
        json!({ "project_id": project["id"], "kind": "INCOME", "amount": "10", "description": "a" }),
    )
    .await;
    post(
        &client,
        srv.url(&format!("/companies/{company_id}/transactions")),
        &admin,
        json!({ "kind": "EXPENSE", "amount": "5", "description": "b" }),
    )
    .await;
    post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": company_id }),
    )
    .await;

    let res = client
        .delete(srv.url(&format!("/companies/{company_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: Value = res.json().await.unwrap();
    assert_eq!(receipt["entity"], "company");
    assert_eq!(receipt["label"], "Acme");
    assert_eq!(receipt["removed"]["companies"], 1);
    assert_eq!(receipt["removed"]["projects"], 1);
    assert_eq!(receipt["removed"]["transactions"], 2);
    assert_eq!(receipt["removed"]["grants"], 1);

    let (status, body) = get(&client, srv.url(&format!("/companies/{company_id}")), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn budget_edit_and_admin_project_listing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);
    let employee = mint_jwt(SECRET, EMPLOYEE);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    let (_, project) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/projects")),
        &admin,
        json!({ "name": "Bridge", "budget": "100000" }),
    )
    .await;
    let project_id = project["id"].as_str().unwrap().to_string();
    post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": company_id }),
    )
    .await;

    let res = client
        .patch(srv.url(&format!("/projects/{project_id}/budget")))
        .bearer_auth(&admin)
        .json(&json!({ "budget": "250000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(decimal(&updated["budget"]), Decimal::from(250_000));

    let res = client
        .patch(srv.url(&format!("/projects/{project_id}/budget")))
        .bearer_auth(&employee)
        .json(&json!({ "budget": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .patch(srv.url(&format!("/projects/{project_id}/budget")))
        .bearer_auth(&admin)
        .json(&json!({ "budget": "99999999999999999999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (status, body) = get(&client, srv.url("/admin/projects"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["company_name"], "Acme");
    assert_eq!(decimal(&items[0]["budget"]), Decimal::from(250_000));

    let (status, _) = get(&client, srv.url("/admin/projects"), &employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn project_report_hides_figures_from_employees() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, ADMIN);
    let employee = mint_jwt(SECRET, EMPLOYEE);

    let company_id = seed_company(&client, &srv, &admin, "Acme").await;
    let (_, project) = post(
        &client,
        srv.url(&format!("/companies/{company_id}/projects")),
        &admin,
        json!({ "name": "Bridge", "budget": "100000" }),
    )
    .await;
    let project_id = project["id"].as_str().unwrap().to_string();
    post(
        &client,
        srv.url("/admin/grants"),
        &admin,
        json!({ "email": EMPLOYEE, "company_id": company_id }),
    )
    .await;

    let now = Utc::now();
    for (kind, amount, hours) in [
        (TransactionKind::Income, 40_000, 25),
        (TransactionKind::Expense, 10_000, 1),
    ] {
        let tx = RecordTransaction {
            company_id: CompanyId::from_str(&company_id).unwrap(),
            project_id: Some(ProjectId::from_str(&project_id).unwrap()),
            kind,
            amount: Decimal::from(amount),
            date: now.date_naive(),
            description: kind.to_string(),
            notes: None,
            evidence_url: None,
        };
        let project = srv.store.project(tx.project_id.unwrap()).await.unwrap();
        let tx = tx
            .into_transaction(project.as_ref(), TransactionId::new(), now - ChronoDuration::hours(hours))
            .unwrap();
        srv.store.insert_transaction(tx).await.unwrap();
    }

    let (status, doc) = get(&client, srv.url(&format!("/projects/{project_id}/report")), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["figures"], "full");
    assert_eq!(decimal(&doc["summary"]["balance"]), Decimal::from(30_000));
    assert_eq!(decimal(&doc["summary"]["collection_percentage"]), Decimal::from(40));
    assert_eq!(doc["rows"].as_array().unwrap().len(), 2);

    let (status, doc) = get(&client, srv.url(&format!("/projects/{project_id}/report")), &employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["figures"], "listing_only");
    assert!(doc["summary"].is_null());
    let rows = doc["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["balance"].is_null());

    let res = client
        .get(srv.url(&format!("/projects/{project_id}/report?format=text")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    let text = res.text().await.unwrap();
    assert!(!text.contains("Total income"));
    assert!(text.contains("Audit signature"));
}
