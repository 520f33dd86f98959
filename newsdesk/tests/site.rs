//! A site wired from settings, talking to a mock hosted backend.

use std::sync::Arc;
use std::time::Duration;

use newsdesk::auth::{Role, Session};
use newsdesk::core::settings::BackendSettings;
use newsdesk::core::{NewsdeskError, Settings};
use newsdesk::db::{Collection, Row};
use newsdesk::forms::{FormController, FormHandler, SubmitOutcome};
use newsdesk::site::Site;
use newsdesk_test::{fixtures, MemoryAuthProvider, RecordingGateway};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    Settings {
        backend: BackendSettings {
            url: format!("{}/", server.uri()),
            anon_key: "anon-key".to_string(),
            ..BackendSettings::default()
        },
        ..Settings::default()
    }
}

fn load<H: FormHandler>(form: &FormController<H>, row: &Row) {
    for (field, value) in row.iter() {
        form.set_field(field, value.clone());
    }
}

async fn requests_to(server: &MockServer, route: &str) -> Vec<Request> {
    for _ in 0..100 {
        let hits: Vec<Request> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == route)
            .collect();
        if !hits.is_empty() {
            return hits;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Vec::new()
}

#[test]
fn test_connect_requires_backend() {
    let Err(err) = Site::connect(Settings::default()) else {
        panic!("expected configuration error");
    };
    assert!(matches!(err, NewsdeskError::Configuration(_)));
}

#[tokio::test]
async fn test_ad_request_over_rest_notifies_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/ad_requests"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "ad-1",
            "institution_name": "Acme Media Group",
            "sector": "media",
            "ad_types": ["job", "sponsored"],
            "ad_details": "Hiring two field reporters for the autumn season",
            "email": "ads@acme.test",
            "phone": "+33 1 23 45 67 89",
            "boost_ad": false,
            "status": "pending",
            "created_at": "2024-03-01T10:00:00+00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/notify-admin-ad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let site = Site::connect(settings(&server)).unwrap();
    site.bootstrap(&MemoryAuthProvider::new()).await;
    assert!(!site.session().is_authenticated());

    let form = site.ad_request_form().unwrap();
    load(&form, &fixtures::ad_request());
    let SubmitOutcome::Submitted(saved) = form.submit().await else {
        panic!("expected success");
    };
    assert_eq!(saved.id.as_deref(), Some("ad-1"));

    let hooks = requests_to(&server, "/functions/v1/notify-admin-ad").await;
    assert_eq!(hooks.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&hooks[0].body).unwrap();
    assert_eq!(body["institution_name"], "Acme Media Group");
    assert_eq!(body["sector"], "media");
}

#[tokio::test]
async fn test_webhook_error_keeps_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/service_requests"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "sr-1",
            "institution_name": "Acme Media Group",
            "sector": "economic",
            "service_type": "dashboard",
            "description": "Monthly dashboard of regional market indicators",
            "email": "data@acme.test",
            "status": "pending"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/notify-admin"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "function crashed"})),
        )
        .mount(&server)
        .await;

    let site = Site::connect(settings(&server)).unwrap();
    let form = site.service_request_form().unwrap();
    load(&form, &fixtures::service_request());

    assert!(matches!(form.submit().await, SubmitOutcome::Submitted(_)));
    assert_eq!(requests_to(&server, "/functions/v1/notify-admin").await.len(), 1);
    assert_eq!(form.error(), None);
}

#[tokio::test]
async fn test_announcement_lands_in_inbox() {
    let gateway = Arc::new(RecordingGateway::new());
    gateway.seed(Collection::Profiles, fixtures::profiles(&["u1", "u2"]));
    let site = Site::with_gateway(Settings::default(), gateway.clone());
    let auth = MemoryAuthProvider::new()
        .with_current(Session::new("admin-1", "admin@newsdesk.test").with_role(Role::Admin));
    site.bootstrap(&auth).await;
    assert!(site.session().is_admin());

    let form = site.admin_notification_form();
    load(&form, &fixtures::admin_notification());
    assert_eq!(form.submit().await, SubmitOutcome::Submitted(2));

    let inbox = site.inbox();
    assert_eq!(inbox.unread_count("u1").await.unwrap(), 1);
    let items = inbox.display("u2", site.translator().as_ref()).await.unwrap();
    assert_eq!(items[0].title, "Scheduled maintenance");
}

#[tokio::test]
async fn test_profile_form_starts_from_stored_profile() {
    let gateway = Arc::new(RecordingGateway::new());
    gateway.seed(
        Collection::Profiles,
        [Row::new()
            .with("id", "user-9")
            .with("full_name", "Noor")
            .with("phone", "+212 611 111 111")
            .with("role", "user")],
    );
    let site = Site::with_gateway(Settings::default(), gateway);
    let auth = MemoryAuthProvider::new().with_current(Session::new("user-9", "noor@newsdesk.test"));
    site.bootstrap(&auth).await;

    let form = site.profile_form().await.unwrap();
    assert_eq!(form.record().text("fullName"), "Noor");
    assert_eq!(form.record().text("phone"), "+212 611 111 111");
}

#[tokio::test]
async fn test_login_switches_backend_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let site = Site::connect(settings(&server)).unwrap();
    let auth = Arc::new(MemoryAuthProvider::new().with_account(
        "editor@newsdesk.test",
        "longenough1",
        Role::User,
    ));
    let form = site.login_form(auth);
    load(&form, &fixtures::login("editor@newsdesk.test", "longenough1"));
    let SubmitOutcome::Submitted(session) = form.submit().await else {
        panic!("expected sign-in");
    };
    assert_eq!(session.user_id, "user-1");

    assert!(site.inbox().list("user-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_over_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/searchable_content"))
        .and(query_param("is_published", "eq.true"))
        .and(query_param(
            "or",
            "(title.ilike.*budget*,description.ilike.*budget*,title_ar.ilike.*budget*,\
             title_fr.ilike.*budget*,description_ar.ilike.*budget*,description_fr.ilike.*budget*)",
        ))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "c1",
            "content_type": "report",
            "title": "Regional budget",
            "title_fr": "Budget régional",
            "description": "Spending by province",
            "url": "/reports/regional-budget",
            "is_published": true,
            "created_at": "2025-01-01T00:00:00+00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let site = Site::connect(settings(&server)).unwrap();
    let hits = site.search().display(" budget ", "fr").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Budget régional");
    assert_eq!(hits[0].description.as_deref(), Some("Spending by province"));

    assert!(site.search().search("").await.unwrap().is_empty());
}
