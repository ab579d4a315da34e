// ==================================
// tests/gateway_flow_tests.rs
// ==================================
//! End-to-end tests for the XML endpoint, driven through the axum router.
mod test_utils;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use backend_lib::{
    config::Settings,
    gateway::XML_CONTENT_TYPE,
    storage::FlatFileAccountStore,
};
use tempfile::TempDir;
use test_utils::*;

#[tokio::test]
async fn test_account_lifecycle() {
    let (app, _state) = setup_router();

    // Create
    let (status, body) = post_xml(&app, create_agt("123456", "pwd")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(0)), "{body}");

    // Same create again
    let (status, body) = post_xml(&app, create_agt("123456", "pwd")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(1)), "{body}");

    // Balance with the right password
    let (status, body) = post_xml(&app, get_balance("123456", "pwd")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(0)), "{body}");
    assert!(body.contains(r#"<extra name="balance">0.0000</extra>"#), "{body}");

    // Wrong password
    let (status, body) = post_xml(&app, get_balance("123456", "wrong")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(4)), "{body}");
    assert!(!body.contains("balance"), "{body}");

    // Unknown account
    let (status, body) = post_xml(&app, get_balance("doesnotexist", "x")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(3)), "{body}");
}

#[tokio::test]
async fn test_account_lifecycle_with_flat_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = FlatFileAccountStore::new(temp_dir.path()).unwrap();
    let (app, _state) = setup_router_with(store, Settings::default());

    let (_, body) = post_xml(&app, create_agt("123456", "pwd")).await;
    assert!(body.contains(&result_code(0)), "{body}");

    // A second router over the same directory sees the account
    let reopened = FlatFileAccountStore::new(temp_dir.path()).unwrap();
    let (app, _state) = setup_router_with(reopened, Settings::default());

    let (_, body) = post_xml(&app, create_agt("123456", "other")).await;
    assert!(body.contains(&result_code(1)), "{body}");

    let (_, body) = post_xml(&app, get_balance("123456", "pwd")).await;
    assert!(body.contains(r#"<extra name="balance">0.0000</extra>"#), "{body}");
}

#[tokio::test]
async fn test_passwords_compare_exactly_as_sent() {
    let (app, _state) = setup_router();

    let (_, body) = post_xml(&app, create_agt("max", "pwd ")).await;
    assert!(body.contains(&result_code(0)), "{body}");

    let (_, body) = post_xml(&app, get_balance("max", "pwd")).await;
    assert!(body.contains(&result_code(4)), "{body}");

    let (_, body) = post_xml(&app, get_balance("max", "pwd ")).await;
    assert!(body.contains(&result_code(0)), "{body}");

    // Whitespace-only passwords are kept, not emptied
    let (_, body) = post_xml(&app, create_agt("blank", "   ")).await;
    assert!(body.contains(&result_code(0)), "{body}");

    let (_, body) = post_xml(&app, get_balance("blank", "")).await;
    assert!(body.contains(&result_code(4)), "{body}");

    let (_, body) = post_xml(&app, get_balance("blank", "   ")).await;
    assert!(body.contains(&result_code(0)), "{body}");
}

#[tokio::test]
async fn test_success_response_is_xml() {
    let (app, _state) = setup_router();

    let response = post_xml_raw(&app, get_balance("nobody", "x")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
        XML_CONTENT_TYPE
    );

    let (_, body) = read(response).await;
    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"), "{body}");
    assert!(body.contains("<response>"), "{body}");
}

#[tokio::test]
async fn test_missing_fields_are_rejected_before_the_store() {
    let cases = [
        (envelope(Some("CREATE-AGT"), None, Some("pwd")), "Missing parameter [login]"),
        (envelope(Some("CREATE-AGT"), Some("max"), None), "Missing parameter [password]"),
        (envelope(None, Some("max"), Some("pwd")), "Missing parameter [request-type]"),
        (envelope(Some("GET-BALANCE"), Some(""), Some("pwd")), "Missing parameter [login]"),
    ];

    for (body, message) in cases {
        let (app, state) = setup_router();
        let (status, response) = post_xml(&app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response.contains("REQ_002"), "{response}");
        assert!(response.contains(message), "{response}");
        assert!(!response.contains("result-code"), "{response}");
        assert_eq!(state.store().calls(), 0);
    }
}

#[tokio::test]
async fn test_unknown_request_type_is_rejected_like_a_missing_field() {
    let (app, state) = setup_router();

    let (status, body) = post_xml(&app, envelope(Some("FOO"), Some("max"), Some("pwd"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("REQ_003"), "{body}");
    assert!(body.contains("Unknown request type [FOO]"), "{body}");
    assert_eq!(state.store().calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let bodies = [
        "",
        "this is not xml",
        "<request><extra name=\"login\">x</request>",
        "<request><extra name=\"login\"><b>x</b></extra></request>",
        "<request/>trailing",
    ];
    for body in bodies {
        let (app, state) = setup_router();
        let (status, response) = post_xml(&app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert!(response.contains("REQ_001"), "{response}");
        assert!(response.contains("Expecting xml data"), "{response}");
        assert_eq!(state.store().calls(), 0);
    }
}

#[tokio::test]
async fn test_non_xml_content_type_is_rejected() {
    let (app, state) = setup_router();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(create_agt("max", "pwd")))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body.contains("MEDIA_001"), "{body}");
    assert_eq!(state.store().calls(), 0);
}

#[tokio::test]
async fn test_missing_content_type_is_accepted() {
    let (app, _state) = setup_router();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(create_agt("max", "pwd")))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&result_code(0)), "{body}");
}

#[tokio::test]
async fn test_only_post_is_routed() {
    let (app, _state) = setup_router();

    let request = Request::builder().method("GET").uri("/").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method("POST")
        .uri("/other")
        .body(Body::from(create_agt("max", "pwd")))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut settings = Settings::default();
    settings.http.max_body_bytes = 64;
    let (app, state) = setup_router_with(CountingStore::default(), settings);

    let body = create_agt(&"x".repeat(200), "pwd");
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, "application/xml")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(state.store().calls(), 0);
}

#[tokio::test]
async fn test_store_outage_is_a_technical_error() {
    let (app, _state) = setup_router_with(UnavailableStore, Settings::default());

    for body in [create_agt("max", "pwd"), get_balance("max", "pwd")] {
        let (status, response) = post_xml(&app, body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.contains(&result_code(2)), "{response}");
        assert!(!response.contains("secret-db-host"), "{response}");
    }
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let mut settings = Settings::default();
    settings.http.request_timeout_secs = 1;
    let store = SlowStore {
        delay: Duration::from_secs(3),
    };
    let (app, _state) = setup_router_with(store, settings);

    let (status, _) = post_xml(&app, get_balance("max", "pwd")).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_concurrent_creates_over_http() {
    let (app, state) = setup_router();

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { post_xml(&app, create_agt("race", &format!("pwd-{i}"))).await })
        })
        .collect();

    let mut ok = 0;
    let mut exists = 0;
    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        if body.contains(&result_code(0)) {
            ok += 1;
        } else if body.contains(&result_code(1)) {
            exists += 1;
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(exists, 11);
    assert!(state.store().calls() >= 12);
}
