// ============================
// crates/backend-lib/src/gateway.rs
// ============================
//! HTTP router and request handling.
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use metrics::counter;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::REQUEST_REJECTED;
use crate::request::Request;
use crate::response;
use crate::storage::AccountStore;
use crate::AppState;

/// Content type of every successful response
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Create the gateway router
pub fn create_router<S: AccountStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let http = state.settings.http.clone();

    Router::new()
        .route("/", post(process::<S>))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            http.request_timeout(),
        ))
        .layer(RequestBodyLimitLayer::new(http.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway until `shutdown` resolves
pub async fn serve<S, F>(
    listener: TcpListener,
    state: Arc<AppState<S>>,
    shutdown: F,
) -> std::io::Result<()>
where
    S: AccountStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for the single protocol endpoint
pub async fn process<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();

    async move {
        let result = handle(&state, &headers, &body).await;

        match &result {
            Err(e) if e.status_code().is_server_error() => {
                error!(error = %e, "request failed");
            },
            Err(e) => {
                info!(reason = e.rejection_reason(), error = %e, "bad request");
                counter!(REQUEST_REJECTED, "reason" => e.rejection_reason()).increment(1);
            },
            Ok(_) => {},
        }

        result
    }
    .instrument(info_span!("request", %request_id))
    .await
}

async fn handle<S: AccountStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, AppError> {
    check_media_type(headers)?;

    // Protocol errors stop here, before the store is touched
    let request = Request::parse(body)?;

    let outcome = state.dispatcher.dispatch(&request).await;
    let xml = response::render_xml(&outcome)?;

    Ok(([(CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response())
}

/// A missing `Content-Type` is accepted; a present one must name an XML type.
fn check_media_type(headers: &HeaderMap) -> Result<(), AppError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::UnsupportedMediaType("<invalid header>".to_string()))?;
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/xml" || essence == "text/xml" || essence.ends_with("+xml") {
        Ok(())
    } else {
        Err(AppError::UnsupportedMediaType(essence))
    }
}
