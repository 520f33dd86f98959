//! Wire-level tests for the hosted REST gateway.

use newsdesk_auth::{Session, SessionStore};
use newsdesk_core::settings::BackendSettings;
use newsdesk_core::NewsdeskError;
use newsdesk_db::{Collection, PersistenceGateway, Q, Query, RestGateway, Row};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> RestGateway {
    let settings = BackendSettings {
        url: format!("{}/", server.uri()),
        anon_key: "anon-key".to_string(),
        ..BackendSettings::default()
    };
    RestGateway::new(&settings).unwrap()
}

#[tokio::test]
async fn test_insert_posts_rows_and_returns_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/service_requests"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{"email": "a@b.com", "sector": "media"}])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "r1", "email": "a@b.com", "sector": "media", "created_at": "2024-03-01T10:00:00+00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let row = Row::new().with("email", "a@b.com").with("sector", "media");
    let stored = gateway(&server)
        .insert_one(Collection::ServiceRequests, row)
        .await
        .unwrap();
    assert_eq!(stored.get_str("id"), Some("r1"));
}

#[tokio::test]
async fn test_select_renders_filter_order_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("user_id", "eq.u1"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "n2", "user_id": "u1", "read": false},
            {"id": "n1", "user_id": "u1", "read": true}
        ])))
        .mount(&server)
        .await;

    let query = Query::all()
        .filter(Q::eq("user_id", "u1"))
        .newest_first()
        .limit(50);
    let rows = gateway(&server)
        .select(Collection::Notifications, &query)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_str("id"), Some("n2"));
}

#[tokio::test]
async fn test_user_token_replaces_anon_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(header("authorization", "Bearer user-token"))
        .and(query_param("id", "eq.u1"))
        .and(body_json(json!({"full_name": "Sam"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionStore::signed_in(
        Session::new("u1", "sam@newsdesk.test").with_access_token("user-token"),
    );
    gateway(&server)
        .with_session(session)
        .update(
            Collection::Profiles,
            &Q::eq("id", "u1"),
            Row::new().with("full_name", "Sam"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/ad_requests"))
        .and(query_param("status", "eq.approved"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-6/7"))
        .mount(&server)
        .await;

    let count = gateway(&server)
        .count(Collection::AdRequests, Some(&Q::eq("status", "approved")))
        .await
        .unwrap();
    assert_eq!(count, 7);
}

#[tokio::test]
async fn test_backend_error_becomes_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .delete(Collection::Notifications, &Q::eq("id", "n1"))
        .await
        .unwrap_err();
    match &err {
        NewsdeskError::Http { status, code, .. } => {
            assert_eq!(*status, 403);
            assert_eq!(code.as_deref(), Some("42501"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert_eq!(err.backend_code(), Some("42501"));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let settings = BackendSettings {
        url: "http://127.0.0.1:1".to_string(),
        anon_key: "anon-key".to_string(),
        timeout_ms: 2_000,
    };
    let err = RestGateway::new(&settings)
        .unwrap()
        .select(Collection::Profiles, &Query::all())
        .await
        .unwrap_err();
    assert!(matches!(err, NewsdeskError::Network(_)));
}

#[tokio::test]
async fn test_bearer_follows_session_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(header("authorization", "Bearer token-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionStore::anonymous();
    let gateway = gateway(&server).with_session(session.clone());
    let query = Query::all();

    gateway.select(Collection::Notifications, &query).await.unwrap();
    session.set(Some(
        Session::new("u7", "u7@newsdesk.test").with_access_token("token-7"),
    ));
    gateway.select(Collection::Notifications, &query).await.unwrap();
    session.set(None);
    gateway.select(Collection::Notifications, &query).await.unwrap();
}
