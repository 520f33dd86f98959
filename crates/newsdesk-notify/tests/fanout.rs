//! Fan-out against a mocked hosted function and the in-memory store.

use std::sync::Arc;

use newsdesk_core::{Catalog, NewsdeskError, Settings};
use newsdesk_db::{Collection, MemoryGateway, PersistenceGateway, Row};
use newsdesk_notify::{DetachedNotification, Inbox, Notifier, StoreNotifier, WebhookNotifier};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.backend.url = server.uri();
    settings.backend.anon_key = "anon-key".to_string();
    settings
}

fn submission() -> Row {
    Row::new()
        .with("institution_name", "Acme")
        .with("sector", "media")
        .with("email", "a@b.com")
        .with("phone", newsdesk_db::Value::Null)
}

#[tokio::test]
async fn test_webhook_posts_payload_to_function() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/notify-admin"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({
            "institution_name": "Acme",
            "sector": "media",
            "email": "a@b.com",
            "phone": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&settings(&server), "notify-admin").unwrap();
    notifier.notify(&[], &submission()).await.unwrap();
}

#[tokio::test]
async fn test_webhook_error_body_becomes_notification_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/notify-admin-ad"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "mail provider down"})),
        )
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&settings(&server), "notify-admin-ad").unwrap();
    let err = notifier.notify(&[], &submission()).await.unwrap_err();
    match err {
        NewsdeskError::Notification(message) => assert_eq!(message, "mail provider down"),
        other => panic!("expected Notification error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_detached_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let notifier: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(&settings(&server), "notify-admin").unwrap());
    let handle = DetachedNotification::new(notifier, Vec::new(), submission()).spawn();
    handle.await.expect("detached task must not panic");
}

#[tokio::test]
async fn test_store_fanout_feeds_inbox() {
    let gateway = Arc::new(MemoryGateway::new());
    let store: Arc<dyn Notifier> = Arc::new(StoreNotifier::new(gateway.clone()));
    let payload = Row::new()
        .with("title", "New feature")
        .with("title_fr", "Nouvelle fonctionnalité")
        .with("message", "Dashboards are live")
        .with("type", "success")
        .with("related_type", "announcement")
        .with("read", false);
    DetachedNotification::new(
        store,
        vec!["u1".to_string(), "u2".to_string()],
        payload,
    )
    .spawn()
    .await
    .unwrap();

    let inbox = Inbox::new(gateway.clone());
    assert_eq!(inbox.unread_count("u1").await.unwrap(), 1);

    let items = inbox
        .display("u1", &Catalog::builtin("fr"))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Nouvelle fonctionnalité");
    assert_eq!(items[0].message, "Dashboards are live");
    assert_eq!(items[0].time_ago, "À l'instant");

    let id = items[0].id.clone().unwrap();
    inbox.mark_read(&id).await.unwrap();
    assert_eq!(inbox.unread_count("u1").await.unwrap(), 0);
    assert_eq!(inbox.unread_count("u2").await.unwrap(), 1);

    inbox.mark_all_read("u2").await.unwrap();
    assert_eq!(inbox.unread_count("u2").await.unwrap(), 0);

    inbox.delete(&id).await.unwrap();
    assert!(inbox.list("u1").await.unwrap().is_empty());
    assert_eq!(
        gateway
            .count(Collection::Notifications, None)
            .await
            .unwrap(),
        1
    );
}
