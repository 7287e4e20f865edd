// Shared fixtures for the end-to-end run tests

use gold_watcher::config::AppConfig;
use gold_watcher::models::{Category, ProductEntry, VendorPattern};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BOT_TOKEN: &str = "123:abc";
pub const CHAT_ID: &str = "-100";

/// Valid config pointing both the catalog and the Bot API at one mock server.
pub fn test_config(server_uri: &str, products: &[(&str, Category)]) -> AppConfig {
    let mut config = AppConfig::default();
    config.rotation.enabled = false;
    config.scraper.pause_ms = 100;
    config.scraper.allowed_hosts = vec!["127.0.0.1".to_string()];
    config.scraper.require_https = false;
    config.vendors = Some(vec![
        VendorPattern::new("foo.com", "Foo"),
        VendorPattern::new("bar.de", "Bar"),
    ]);
    config.catalog = Some(
        products
            .iter()
            .map(|(name, category)| {
                ProductEntry::new(*name, format!("{}/{}", server_uri, name.to_lowercase()), *category)
            })
            .collect(),
    );
    config.telegram.api_base = server_uri.to_string();
    config.telegram.bot_token = Some(BOT_TOKEN.to_string());
    config.telegram.chat_id = Some(CHAT_ID.to_string());
    config
}

pub fn send_message_path() -> String {
    format!("/bot{}/sendMessage", BOT_TOKEN)
}

pub async fn mount_page(server: &MockServer, product: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", product.to_lowercase())))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_send_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 7 }
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Text of the single report posted to the mock Bot API.
pub async fn sent_text(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap_or_default();
    let request = requests
        .iter()
        .find(|r| r.url.path() == send_message_path())
        .expect("no report was posted");
    let payload: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    payload["text"].as_str().unwrap().to_string()
}
