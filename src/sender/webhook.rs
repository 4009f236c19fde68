//! Webhook delivery channel
//!
//! Delivers broadcasts as JSON payloads via HTTP POST to a relay endpoint
//! (the gateway that forwards them into the actual chat platform).
//!
//! # Outcome classification
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 2xx | Delivered |
//! | 401, 403, 404, 410 | Permanent (destination gone or access revoked) |
//! | 408, 429, 5xx | Transient |
//! | transport error / timeout | Transient |
//!
//! The permanent class corresponds to the platform telling us the
//! destination no longer exists or the relay was evicted from it; anything
//! else is worth another attempt on a later cycle.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{DeliveryOutcome, Sender, SenderError};
use crate::models::{Broadcast, Destination};

/// Webhook sender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Relay endpoint URL
    pub endpoint: String,

    /// Optional authentication token (sent as Bearer token)
    pub auth_token: Option<String>,

    /// Request timeout in seconds; a timed-out delivery classifies as a
    /// transient failure
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid endpoint URL '{}': {e}", self.endpoint))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("Endpoint URL must use http or https".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook delivery channel
///
/// # Payload format
///
/// ```json
/// {
///   "destination_id": -1001234567890,
///   "thread_id": 42,
///   "text": "Spring sale!",
///   "media": { "kind": "photo", "ref": "file-abc" },
///   "button": { "text": "More", "url": "https://example.com" }
/// }
/// ```
pub struct WebhookSender {
    config: WebhookConfig,
    client: Client,
}

impl WebhookSender {
    /// Create a new webhook sender
    pub fn new(config: WebhookConfig) -> Result<Self, SenderError> {
        config.validate().map_err(SenderError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create from a bare endpoint URL with default settings
    pub fn from_endpoint(endpoint: impl Into<String>) -> Result<Self, SenderError> {
        Self::new(WebhookConfig::new(endpoint))
    }

    fn render_payload(broadcast: &Broadcast, destination: &Destination) -> serde_json::Value {
        let mut body = json!({
            "destination_id": destination.id,
            "text": broadcast.payload.text,
        });

        if let Some(thread_id) = broadcast.payload.thread_id {
            body["thread_id"] = json!(thread_id);
        }
        if let (Some(kind), Some(file_ref)) = (
            broadcast.payload.media_kind,
            broadcast.payload.media_ref.as_deref(),
        ) {
            body["media"] = json!({ "kind": kind.as_str(), "ref": file_ref });
        }
        if let Some(button) = &broadcast.payload.button {
            body["button"] = json!({ "text": button.text, "url": button.url });
        }

        body
    }

    fn classify_status(status: StatusCode, body_hint: &str) -> DeliveryOutcome {
        if status.is_success() {
            return DeliveryOutcome::Delivered;
        }

        match status {
            StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::GONE => {
                DeliveryOutcome::permanent(format!("destination unreachable: {status} {body_hint}"))
            }
            _ => DeliveryOutcome::transient(format!("HTTP {status} {body_hint}")),
        }
    }
}

#[async_trait]
impl Sender for WebhookSender {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, broadcast: &Broadcast, destination: &Destination) -> DeliveryOutcome {
        let payload = Self::render_payload(broadcast, destination);

        let mut request = self.client.post(&self.config.endpoint).json(&payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let body_hint = response.text().await.unwrap_or_default();
                let hint = body_hint.chars().take(200).collect::<String>();
                Self::classify_status(status, hint.trim())
            }
            Err(e) if e.is_timeout() => DeliveryOutcome::transient("request timed out"),
            Err(e) => DeliveryOutcome::transient(format!("request failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, Payload};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_broadcast() -> Broadcast {
        Broadcast {
            id: 1,
            destination_id: -100,
            payload: Payload::text("hello")
                .with_media(MediaKind::Photo, "file-1")
                .with_button("More", "https://example.com"),
            interval_minutes: 60,
            duration_minutes: 1440,
            is_active: true,
            created_at: 0,
            last_sent_at: None,
        }
    }

    #[test]
    fn test_config_validate() {
        assert!(WebhookConfig::new("https://relay.example.com/send")
            .validate()
            .is_ok());
        assert!(WebhookConfig::new("not a url").validate().is_err());
        assert!(WebhookConfig::new("ftp://relay.example.com")
            .validate()
            .is_err());
        assert!(WebhookConfig::new("https://relay.example.com")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_render_payload() {
        let broadcast = test_broadcast();
        let dest = Destination::new(-100);

        let payload = WebhookSender::render_payload(&broadcast, &dest);
        assert_eq!(payload["destination_id"], -100);
        assert_eq!(payload["text"], "hello");
        assert_eq!(payload["media"]["kind"], "photo");
        assert_eq!(payload["button"]["url"], "https://example.com");
        assert!(payload.get("thread_id").is_none());
    }

    #[tokio::test]
    async fn test_deliver_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(json!({ "text": "hello" })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let sender = WebhookSender::from_endpoint(format!("{}/send", server.uri())).unwrap();
        let outcome = sender
            .deliver(&test_broadcast(), &Destination::new(-100))
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_deliver_permanent_on_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("chat not found"))
            .mount(&server)
            .await;

        let sender = WebhookSender::from_endpoint(format!("{}/send", server.uri())).unwrap();
        let outcome = sender
            .deliver(&test_broadcast(), &Destination::new(-100))
            .await;

        match outcome {
            DeliveryOutcome::Permanent { reason } => {
                assert!(reason.contains("chat not found"));
            }
            other => panic!("expected permanent failure, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_deliver_transient_on_rate_limit_and_server_error() {
        for status in [408u16, 429, 500, 503] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let sender = WebhookSender::from_endpoint(format!("{}/send", server.uri())).unwrap();
            let outcome = sender
                .deliver(&test_broadcast(), &Destination::new(-100))
                .await;

            assert!(
                matches!(outcome, DeliveryOutcome::Transient { .. }),
                "status {status} should classify as transient, got {outcome}"
            );
        }
    }

    #[tokio::test]
    async fn test_deliver_transient_on_connection_failure() {
        // Nothing listens on this port.
        let sender = WebhookSender::from_endpoint("http://127.0.0.1:1/send").unwrap();
        let outcome = sender
            .deliver(&test_broadcast(), &Destination::new(-100))
            .await;

        assert!(matches!(outcome, DeliveryOutcome::Transient { .. }));
    }
}
