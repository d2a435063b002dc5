//! HTTP tests against the router backed by the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use equipool_server::{
    api,
    models::{AccountClaims, Role},
    repository::MemoryStore,
    AppConfig, AppState,
};

struct TestApp {
    router: Router,
    secret: String,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let secret = config.auth.jwt_secret.clone();
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        Self {
            router: api::router(state),
            secret,
        }
    }

    fn token(&self, account: &str, role: Role) -> String {
        AccountClaims::new(account, role, 1)
            .create_token(&self.secret)
            .expect("Failed to sign token")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn missing_or_forged_token_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/equipment", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthenticated");

    let forged = AccountClaims::new("eve", Role::Admin, 1)
        .create_token("not-the-secret")
        .unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/v1/equipment", Some(&forged), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn borrowers_cannot_edit_catalog() {
    let app = TestApp::new();
    let alice = app.token("alice", Role::Borrower);
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/equipment",
            Some(&alice),
            Some(json!({ "name": "Projector", "quantity": 3, "daily_price": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = app.send(Method::GET, "/api/v1/stats", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::GET, "/api/v1/requests", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_equipment_is_bad_request() {
    let app = TestApp::new();
    let admin = app.token("root", Role::Admin);
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/equipment",
            Some(&admin),
            Some(json!({ "name": "  ", "quantity": 0, "daily_price": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn rental_lifecycle_over_http() {
    let app = TestApp::new();
    let admin = app.token("root", Role::Admin);
    let alice = app.token("alice", Role::Borrower);
    let bob = app.token("bob", Role::Borrower);

    let (status, projector) = app
        .send(
            Method::POST,
            "/api/v1/equipment",
            Some(&admin),
            Some(json!({ "name": "Projector", "quantity": 3, "daily_price": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(projector["available"], 3);
    let equipment_id = projector["id"].as_i64().unwrap();

    let (status, request) = app
        .send(
            Method::POST,
            "/api/v1/requests",
            Some(&alice),
            Some(json!({ "equipment_id": equipment_id, "quantity": 2, "duration_days": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["total_price"], 16);
    assert_eq!(request["status"], "pending");
    assert_eq!(request["borrower"], "alice");
    let request_id = request["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/requests",
            Some(&bob),
            Some(json!({ "equipment_id": equipment_id, "quantity": 2, "duration_days": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InsufficientStock");

    let uri = format!("/api/v1/requests/{}", request_id);
    let (status, _) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("{}/process", uri),
            Some(&alice),
            Some(json!({ "approve": true })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = app
        .send(
            Method::POST,
            &format!("{}/process", uri),
            Some(&admin),
            Some(json!({ "approve": true, "comment": "Desk 2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["admin_comment"], "Desk 2");

    let (status, _) = app
        .send(Method::POST, &format!("{}/return", uri), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, returning) = app
        .send(Method::POST, &format!("{}/return", uri), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returning["status"], "return_requested");

    let (status, done) = app
        .send(Method::POST, &format!("{}/confirm-return", uri), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, body) = app
        .send(Method::POST, &format!("{}/return", uri), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvalidTransition");

    let (status, equipment) = app
        .send(
            Method::GET,
            &format!("/api/v1/equipment/{}", equipment_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(equipment["available"], 3);
    assert_eq!(equipment["is_available"], true);

    let (status, mine) = app.send(Method::GET, "/api/v1/requests/mine", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, audit) = app.send(Method::GET, "/api/v1/audit", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit, json!([]));

    let (status, stats) = app.send(Method::GET, "/api/v1/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["requests"]["completed"], 1);
    assert_eq!(stats["completed_revenue"], 16);
}

#[tokio::test]
async fn removal_blocked_while_units_are_out() {
    let app = TestApp::new();
    let admin = app.token("root", Role::Admin);
    let alice = app.token("alice", Role::Borrower);

    let (_, tent) = app
        .send(
            Method::POST,
            "/api/v1/equipment",
            Some(&admin),
            Some(json!({ "name": "Tent", "quantity": 2, "daily_price": 10 })),
        )
        .await;
    let uri = format!("/api/v1/equipment/{}", tent["id"]);

    let (status, request) = app
        .send(
            Method::POST,
            "/api/v1/requests",
            Some(&alice),
            Some(json!({ "equipment_id": tent["id"].clone(), "quantity": 2, "duration_days": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvariantViolation");

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "name": "Tent", "quantity": 1, "daily_price": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvariantViolation");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/requests/{}/process", request["id"]),
            Some(&admin),
            Some(json!({ "approve": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, list) = app.send(Method::GET, "/api/v1/equipment", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, history) = app
        .send(Method::GET, "/api/v1/borrowers/alice/requests", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["status"], "rejected");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = TestApp::new();
    let admin = app.token("root", Role::Admin);
    let (status, body) = app
        .send(Method::GET, "/api/v1/equipment/404", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/requests/404/process",
            Some(&admin),
            Some(json!({ "approve": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
