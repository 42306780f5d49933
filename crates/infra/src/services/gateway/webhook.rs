use super::{GatewayError, IMessageGateway};
use serde::Serialize;
use tickler_domain::OwnerId;

pub const WEBHOOK_KEY_HEADER: &str = "tickler-webhook-key";

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    recipient_id: i64,
    text: &'a str,
}

/// Delivers reminder texts by POSTing them to the configured webhook
/// endpoint, authenticated with a shared key header.
pub struct WebhookGateway {
    client: reqwest::Client,
    url: String,
    key: String,
}

impl WebhookGateway {
    pub fn new(url: String, key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            key,
        }
    }
}

#[async_trait::async_trait]
impl IMessageGateway for WebhookGateway {
    async fn send(&self, recipient: &OwnerId, text: &str) -> Result<(), GatewayError> {
        let res = self
            .client
            .post(&self.url)
            .header(WEBHOOK_KEY_HEADER, &self.key)
            .json(&WebhookMessage {
                recipient_id: recipient.inner(),
                text,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(GatewayError::Rejected(res.status()));
        }
        Ok(())
    }
}
