mod telemetry;

use std::sync::Arc;
use telemetry::{get_subscriber, init_subscriber};
use tickler_engine::Scheduler;
use tickler_infra::{setup_context, WebhookGateway};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("tickler".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await;

    let webhook_url = context
        .config
        .webhook_url
        .clone()
        .expect("WEBHOOK_URL env var to be present.");
    let gateway = Arc::new(WebhookGateway::new(
        webhook_url,
        context.config.webhook_key.clone(),
    ));

    let mut scheduler = Scheduler::new(context, gateway);
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    scheduler.stop().await;
    Ok(())
}
