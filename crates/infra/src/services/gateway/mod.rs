mod inmemory;
mod webhook;

pub use inmemory::InMemoryMessageGateway;
pub use webhook::{WebhookGateway, WEBHOOK_KEY_HEADER};

use thiserror::Error;
use tickler_domain::OwnerId;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway rejected the message with status: {0}")]
    Rejected(reqwest::StatusCode),
    #[error("delivery refused: {0}")]
    Refused(String),
}

/// Chat transport that delivers a reminder's text to its recipient.
#[async_trait::async_trait]
pub trait IMessageGateway: Send + Sync {
    async fn send(&self, recipient: &OwnerId, text: &str) -> Result<(), GatewayError>;
}
