mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::{IReminderRepo, InMemoryReminderRepo, Repos, SqliteReminderRepo};
pub use services::{
    GatewayError, IMessageGateway, InMemoryMessageGateway, WebhookGateway, WEBHOOK_KEY_HEADER,
};
use std::sync::Arc;
pub use system::{ISys, RealSys};

#[derive(Clone)]
pub struct TicklerContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub database_url: String,
}

impl TicklerContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_sqlite(&params.database_url)
            .await
            .expect("Database URL must point to a usable SQLite database");
        Self {
            repos,
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context backed entirely by in-memory fakes, for tests.
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> TicklerContext {
    TicklerContext::create(ContextParams {
        database_url: get_database_url(),
    })
    .await
}

fn get_database_url() -> String {
    const DATABASE_URL: &str = "DATABASE_URL";

    std::env::var(DATABASE_URL)
        .unwrap_or_else(|_| panic!("{} env var to be present.", DATABASE_URL))
}
