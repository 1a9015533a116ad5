//! Command-level integration tests: a fully wired context pointed at a
//! mocked CRM surface and temporary storage.

use std::sync::{Arc, Mutex};

use chatsync_api::{disconnect_crm, get_stored_tokens, start_crm_auth, sync_message};
use chatsync_api::{AppContext, AppContextOptions};
use chatsync_core::{ConsentBrowser, EventSink};
use chatsync_domain::constants::EVENT_DISCONNECTED;
use chatsync_domain::{Result, SyncMessage, TokenSet};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(String, Option<bool>)>>,
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &str, payload: Option<bool>) {
        self.events.lock().unwrap().push((event.to_string(), payload));
    }
}

#[derive(Default)]
struct NullBrowser;

impl ConsentBrowser for NullBrowser {
    fn open(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn close(&self) {}
}

async fn context_for(
    server: &MockServer,
    dir: &TempDir,
    sink: Arc<RecordingSink>,
) -> Arc<AppContext> {
    let options = AppContextOptions {
        token_path: Some(dir.path().join("crm_tokens.json")),
        settings_path: Some(dir.path().join("settings.json")),
        api_base_url: Some(server.uri()),
        token_endpoint: Some(format!("{}/oauth/v1/token", server.uri())),
        callback_port: Some(0),
        event_sink: Some(sink as Arc<dyn EventSink>),
        consent_browser: Some(Arc::new(NullBrowser)),
        ..Default::default()
    };
    AppContext::with_options(options).await.expect("context")
}

#[tokio::test]
async fn stored_tokens_round_trip_through_the_command() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &dir, Arc::new(RecordingSink::default())).await;

    assert_eq!(get_stored_tokens(&ctx).await, Ok(None));

    let saved = TokenSet::new("access".to_string(), Some("refresh".to_string()), Some(3600));
    ctx.tokens.save(saved.clone()).await.unwrap();

    assert_eq!(get_stored_tokens(&ctx).await, Ok(Some(saved)));
}

#[tokio::test]
async fn disconnect_clears_the_record_and_notifies_the_host() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let ctx = context_for(&server, &dir, Arc::clone(&sink)).await;

    ctx.tokens
        .save(TokenSet::new("access".to_string(), Some("refresh".to_string()), Some(3600)))
        .await
        .unwrap();

    disconnect_crm(&ctx).await.expect("disconnect");

    assert_eq!(get_stored_tokens(&ctx).await, Ok(None));
    let events = sink.events.lock().unwrap().clone();
    assert_eq!(events, vec![(EVENT_DISCONNECTED.to_string(), None)]);
}

#[tokio::test]
async fn sync_message_posts_contact_and_company_events() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .and(body_partial_json(json!({
            "filterGroups": [{"filters": [{"propertyName": "email", "value": "ada@example.com"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"id": "301"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/timeline/events"))
        .and(body_partial_json(json!({"objectId": "301"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-1",
            "objectId": "301"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/contacts/301/associations/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "900"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/contacts/301"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "301",
            "properties": {"firstname": "Ada", "lastname": "Lovelace"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Identity introspection fails softly; the company event simply carries
    // no portal reference.
    Mock::given(method("GET"))
        .and(path_regex(r"^/oauth/v1/access-tokens/.+$"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/timeline/events"))
        .and(body_partial_json(json!({
            "objectId": "900",
            "tokens": {"contactName": "Ada Lovelace"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "evt-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &dir, Arc::new(RecordingSink::default())).await;
    ctx.tokens
        .save(TokenSet::new("access".to_string(), Some("refresh".to_string()), Some(3600)))
        .await
        .unwrap();

    let message = SyncMessage {
        address: "ada@example.com".to_string(),
        text: "hello from the test".to_string(),
        is_inbound: true,
        sender: "Ada Lovelace".to_string(),
        timestamp: None,
    };

    sync_message(&ctx, message).await.expect("sync never fails");
}

#[tokio::test]
async fn sync_message_without_tokens_touches_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &dir, Arc::new(RecordingSink::default())).await;

    let message = SyncMessage {
        address: "+15551234567".to_string(),
        text: "hello".to_string(),
        is_inbound: true,
        sender: "Ada".to_string(),
        timestamp: Some(1_700_000_000),
    };

    sync_message(&ctx, message).await.expect("sync never fails");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn start_crm_auth_without_credentials_is_a_config_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &dir, Arc::new(RecordingSink::default())).await;

    let result = start_crm_auth(&ctx).await;
    let err = result.expect_err("unconfigured credentials must fail");
    assert!(err.contains("client id"));
}
