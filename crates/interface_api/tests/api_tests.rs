//! HTTP API tests over the in-memory ledger store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use domain_ledger::ports::memory::InMemoryLedgerStore;
use domain_ledger::{LedgerConfig, LedgerService, LedgerStore};
use interface_api::create_router;
use test_utils::{AccountCodes, IdFixtures};

struct TestApp {
    router: Router,
    store: Arc<InMemoryLedgerStore>,
}

impl TestApp {
    async fn seeded() -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = LedgerService::new(store.clone(), LedgerConfig::default());
        service.seed_standard_chart().await.unwrap();
        Self {
            router: create_router(Arc::new(service)),
            store,
        }
    }

    async fn account_id(&self, code: &str) -> String {
        self.store
            .find_account_by_code(code)
            .await
            .unwrap()
            .unwrap()
            .id
            .as_uuid()
            .to_string()
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", IdFixtures::user_id().as_uuid().to_string());
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

// ============================================================================
// Health Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = TestApp::seeded().await;

        let (status, body) = app.send("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.send("GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }
}

// ============================================================================
// Account Tests
// ============================================================================

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_accounts_can_hide_equity() {
        let app = TestApp::seeded().await;
        // Materialize the equity account through a batch
        let cash = app.account_id(AccountCodes::CASH).await;
        app.send(
            "POST",
            "/api/v1/opening-balances",
            Some(json!({
                "date": "2025-01-01",
                "general_lines": [{ "account_id": cash, "debit": "10.00" }]
            })),
        )
        .await;

        let (status, all) = app.send("GET", "/api/v1/accounts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["success"], true);

        let (_, filtered) = app
            .send("GET", "/api/v1/accounts?exclude_code=3900", None)
            .await;
        let all = all["data"].as_array().unwrap();
        let filtered = filtered["data"].as_array().unwrap();
        assert_eq!(filtered.len() + 1, all.len());
        assert!(filtered.iter().all(|a| a["code"] != "3900"));
    }

    #[tokio::test]
    async fn test_create_update_delete_account() {
        let app = TestApp::seeded().await;

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/accounts",
                Some(json!({ "code": "1020", "name": "Petty cash", "category": "CURRENT_ASSET" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/accounts",
                Some(json!({ "code": "1020", "name": "Again", "category": "CURRENT_ASSET" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, updated) = app
            .send(
                "PUT",
                &format!("/api/v1/accounts/{}", id),
                Some(json!({ "name": "Petty cash box" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"], "Petty cash box");
        assert_eq!(updated["data"]["code"], "1020");

        let (status, _) = app
            .send("DELETE", &format!("/api/v1/accounts/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send("GET", &format!("/api/v1/accounts/{}/balance", id), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_kind"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_code_change_is_rejected() {
        let app = TestApp::seeded().await;
        let cash = app.account_id(AccountCodes::CASH).await;

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/v1/accounts/{}", cash),
                Some(json!({ "code": "1011" })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_kind"], "VALIDATION");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::seeded().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/accounts")
            .header("content-type", "application/json")
            .header("x-user-id", IdFixtures::user_id().as_uuid().to_string())
            .body(Body::from("{\"code\": "))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_id_gets_uniform_body() {
        let app = TestApp::seeded().await;

        let (status, body) = app
            .send("GET", "/api/v1/accounts/not-a-uuid/balance", None)
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
    }
}

// ============================================================================
// Journal Tests
// ============================================================================

mod journal_tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_entry_lifecycle() {
        let app = TestApp::seeded().await;
        let cash = app.account_id(AccountCodes::CASH).await;
        let sales = app.account_id(AccountCodes::SALES).await;

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/journal-entries",
                Some(json!({
                    "entry_date": "2025-01-10",
                    "description": "Counter sale",
                    "lines": [
                        { "account_id": cash, "debit": "75.25" },
                        { "account_id": sales, "credit": "75.25" }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["status"], "DRAFT");
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, posted) = app
            .send("POST", &format!("/api/v1/journal-entries/{}/post", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(posted["data"], "POSTED");

        let (_, again) = app
            .send("POST", &format!("/api/v1/journal-entries/{}/post", id), None)
            .await;
        assert_eq!(again["data"], "ALREADY_POSTED");

        let (status, reversal) = app
            .send(
                "POST",
                &format!("/api/v1/journal-entries/{}/reverse", id),
                Some(json!({ "reason": "wrong period", "reversal_date": "2025-01-11" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reversal["data"]["entry_date"], "2025-01-11");

        let (status, _) = app
            .send(
                "POST",
                &format!("/api/v1/journal-entries/{}/reverse", id),
                Some(json!({ "reason": "again" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unbalanced_entry_is_unprocessable() {
        let app = TestApp::seeded().await;
        let cash = app.account_id(AccountCodes::CASH).await;
        let sales = app.account_id(AccountCodes::SALES).await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/journal-entries",
                Some(json!({
                    "entry_date": "2025-01-10",
                    "description": "Off by a cent",
                    "lines": [
                        { "account_id": cash, "debit": "10.00" },
                        { "account_id": sales, "credit": "9.99" }
                    ],
                    "post": true
                })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_kind"], "VALIDATION");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_writes_require_acting_user() {
        let app = TestApp::seeded().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/journal-entries")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Opening Balance Tests
// ============================================================================

mod opening_tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_list_and_delete() {
        let app = TestApp::seeded().await;
        let cash = app.account_id(AccountCodes::CASH).await;
        let loan = app.account_id(AccountCodes::LOAN).await;
        let customer = IdFixtures::customer_id().as_uuid().to_string();

        let batch = json!({
            "date": "2025-01-01",
            "general_lines": [
                { "account_id": cash, "debit": "1000.00" },
                { "account_id": loan, "credit": "400.00" }
            ],
            "receivables": [
                { "party_id": customer, "invoice_number": "INV-100", "amount": "5000000.00" }
            ]
        });

        let (status, summary) = app
            .send("POST", "/api/v1/opening-balances", Some(batch.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(summary["data"]["journal_entries"].as_array().unwrap().len(), 2);

        let (status, duplicate) = app
            .send("POST", "/api/v1/opening-balances", Some(batch))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(duplicate["error_kind"], "DUPLICATE_REFERENCE");

        let (status, listed) = app
            .send("GET", "/api/v1/opening-balances/receivable", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let invoices = listed["data"].as_array().unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0]["status"], "UNPAID");
        let invoice_id = invoices[0]["id"].as_str().unwrap().to_string();

        let (status, deleted) = app
            .send(
                "DELETE",
                &format!("/api/v1/opening-balances/ar/{}", invoice_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["data"]["order_number"], "SO-OPEN-INV-100");

        let (_, trial_balance) = app.send("GET", "/api/v1/trial-balance", None).await;
        assert_eq!(trial_balance["data"]["is_balanced"], true);
    }

    #[tokio::test]
    async fn test_unknown_sub_ledger_is_unprocessable() {
        let app = TestApp::seeded().await;

        let (status, body) = app
            .send("GET", "/api/v1/opening-balances/inventory", None)
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_kind"], "VALIDATION");
    }

    #[tokio::test]
    async fn test_empty_batch_is_unprocessable() {
        let app = TestApp::seeded().await;

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/opening-balances",
                Some(json!({ "date": "2025-01-01" })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_sub_minor_amount_is_unprocessable() {
        let app = TestApp::seeded().await;
        let customer = IdFixtures::customer_id().as_uuid().to_string();
        let before = app.store.counts().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/opening-balances",
                Some(json!({
                    "date": "2025-01-01",
                    "receivables": [
                        { "party_id": customer, "invoice_number": "INV-1", "amount": "0.004" }
                    ]
                })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_kind"], "VALIDATION");
        assert_eq!(app.store.counts().await, before);
    }

    #[tokio::test]
    async fn test_repeated_invoice_number_is_conflict() {
        let app = TestApp::seeded().await;
        let customer = IdFixtures::customer_id().as_uuid().to_string();

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/opening-balances",
                Some(json!({
                    "date": "2025-01-01",
                    "receivables": [
                        { "party_id": customer, "invoice_number": "INV-7", "amount": "10.00" },
                        { "party_id": customer, "invoice_number": "INV-7", "amount": "20.00" }
                    ]
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_kind"], "DUPLICATE_REFERENCE");
    }
}
