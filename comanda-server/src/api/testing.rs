//! Helpers for driving the full router in handler tests

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use shared::models::{User, UserRole};
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::audit::{AuditLogRequest, AuditWorker};
use crate::core::ServerState;
use crate::message::{ChannelListener, LISTENER_QUEUE};
use crate::services::web::build_app;

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub audit_rx: mpsc::Receiver<AuditLogRequest>,
}

impl TestApp {
    pub async fn new() -> Self {
        let (state, audit_rx) = ServerState::for_tests().await;
        Self {
            app: build_app(state.clone()),
            state,
            audit_rx,
        }
    }

    /// Signed token for a user that does not need to exist in the database
    pub fn token(&self, id: i64, name: &str, role: UserRole) -> String {
        let user = User {
            id,
            name: name.into(),
            role,
            pin_hash: String::new(),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        self.state.jwt.generate_token(&user).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token(1, "Admin", UserRole::Admin)
    }

    pub fn waiter_token(&self) -> String {
        self.token(2, "Lucia", UserRole::Mozo)
    }

    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> http::Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Drain audit entries queued so far
    pub fn audited(&mut self) -> Vec<AuditLogRequest> {
        let mut entries = Vec::new();
        while let Ok(entry) = self.audit_rx.try_recv() {
            entries.push(entry);
        }
        entries
    }

    /// Persist queued audit entries the way the background worker would
    pub async fn flush_audit(&mut self) {
        let worker = AuditWorker::new(self.state.db.clone());
        for entry in self.audited() {
            worker.write(entry).await;
        }
    }

    /// Create a table through the admin API and return its id
    pub async fn create_table(&self, name: &str) -> i64 {
        let token = self.admin_token();
        let (status, body) = self
            .send("POST", "/api/tables", Some(&token), Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Create a product through the admin API and return its id
    pub async fn create_product(&self, name: &str, price: f64) -> i64 {
        let token = self.admin_token();
        let (status, body) = self
            .send(
                "POST",
                "/api/products",
                Some(&token),
                Some(serde_json::json!({ "name": name, "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Join the kitchen hub like a connected screen
    pub fn listen(&self) -> mpsc::Receiver<Arc<str>> {
        let (listener, rx) = ChannelListener::new(LISTENER_QUEUE);
        self.state.hub.join(Arc::new(listener));
        rx
    }
}

/// Drain events delivered to a [`TestApp::listen`] receiver
pub fn received(rx: &mut mpsc::Receiver<Arc<str>>) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        events.push(serde_json::from_str(&payload).unwrap());
    }
    events
}
