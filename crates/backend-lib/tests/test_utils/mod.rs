//! Test utilities for gateway tests
//!
//! Provides store doubles and helpers for driving the router with
//! `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, Response, StatusCode},
    Router,
};
use backend_lib::{
    account::Account,
    config::Settings,
    gateway::create_router,
    storage::{AccountStore, MemoryAccountStore, StoreError},
    AppState,
};
use tower::ServiceExt;

/// In-memory store that counts every call it receives
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryAccountStore,
    finds: AtomicUsize,
    creates: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.finds.load(Ordering::SeqCst) + self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for CountingStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_login(login).await
    }

    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(login, password).await
    }
}

/// Store that is always down
pub struct UnavailableStore;

#[async_trait]
impl AccountStore for UnavailableStore {
    async fn find_by_login(&self, _login: &str) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Unavailable("secret-db-host:5432 refused connection".to_string()))
    }

    async fn create(&self, _login: &str, _password: &str) -> Result<Account, StoreError> {
        Err(StoreError::Unavailable("secret-db-host:5432 refused connection".to_string()))
    }
}

/// Store that answers after a fixed delay
pub struct SlowStore {
    pub delay: Duration,
}

#[async_trait]
impl AccountStore for SlowStore {
    async fn find_by_login(&self, _login: &str) -> Result<Option<Account>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Account::open(login, password))
    }
}

/// Router over a counting store with default settings
pub fn setup_router() -> (Router, Arc<AppState<CountingStore>>) {
    setup_router_with(CountingStore::default(), Settings::default())
}

pub fn setup_router_with<S: AccountStore + 'static>(
    store: S,
    settings: Settings,
) -> (Router, Arc<AppState<S>>) {
    let state = Arc::new(AppState::new(store, settings));
    (create_router(state.clone()), state)
}

/// Build a request envelope
pub fn envelope(request_type: Option<&str>, login: Option<&str>, password: Option<&str>) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<request>\n");
    if let Some(request_type) = request_type {
        xml.push_str(&format!("  <request-type>{request_type}</request-type>\n"));
    }
    if let Some(login) = login {
        xml.push_str(&format!("  <extra name=\"login\">{login}</extra>\n"));
    }
    if let Some(password) = password {
        xml.push_str(&format!("  <extra name=\"password\">{password}</extra>\n"));
    }
    xml.push_str("</request>");
    xml
}

pub fn create_agt(login: &str, password: &str) -> String {
    envelope(Some("CREATE-AGT"), Some(login), Some(password))
}

pub fn get_balance(login: &str, password: &str) -> String {
    envelope(Some("GET-BALANCE"), Some(login), Some(password))
}

/// POST a body to `/` with an XML content type
pub async fn post_xml(app: &Router, body: impl Into<String>) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, "application/xml")
        .body(Body::from(body.into()))
        .unwrap();
    send(app, request).await
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    read(response).await
}

pub async fn read(response: Response<Body>) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Send and return the full response, headers included
pub async fn post_xml_raw(app: &Router, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, "text/xml")
        .body(Body::from(body.into()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub fn result_code(code: u8) -> String {
    format!("<result-code>{code}</result-code>")
}
