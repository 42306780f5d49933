mod gateway;

pub use gateway::{
    GatewayError, IMessageGateway, InMemoryMessageGateway, WebhookGateway, WEBHOOK_KEY_HEADER,
};
