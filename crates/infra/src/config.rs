use std::time::Duration;
use tickler_utils::create_random_secret;
use tracing::info;

const WEBHOOK_KEY_LEN: usize = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook endpoint the messaging gateway delivers reminder texts to.
    /// Absent in test setups that install an in-memory gateway instead.
    pub webhook_url: Option<String>,
    /// Shared key sent along with every webhook delivery so the receiver
    /// can authenticate this process.
    pub webhook_key: String,
    /// How many delivery attempts are made before a firing is given up on.
    pub delivery_max_attempts: u32,
    /// Delay before the second delivery attempt; doubled after every
    /// further failure.
    pub delivery_retry_backoff: Duration,
    /// Upper bound on a single delivery attempt.
    pub delivery_attempt_timeout: Duration,
}

impl Config {
    pub fn new() -> Self {
        let webhook_url = std::env::var("WEBHOOK_URL").ok();
        let webhook_key = match std::env::var("WEBHOOK_KEY") {
            Ok(key) => key,
            Err(_) => {
                info!("Did not find WEBHOOK_KEY environment variable. Going to create one.");
                let key = create_random_secret(WEBHOOK_KEY_LEN);
                info!("Webhook key was generated and set to: {}", key);
                key
            }
        };
        Self {
            webhook_url,
            webhook_key,
            delivery_max_attempts: 3,
            delivery_retry_backoff: Duration::from_millis(500),
            delivery_attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn it_reads_webhook_key_from_env() {
        std::env::set_var("WEBHOOK_KEY", "configured-key");
        let config = Config::new();
        assert_eq!(config.webhook_key, "configured-key");
        std::env::remove_var("WEBHOOK_KEY");
    }

    #[test]
    #[serial]
    fn it_generates_webhook_key_when_env_is_absent() {
        std::env::remove_var("WEBHOOK_KEY");
        let config = Config::new();
        assert_eq!(config.webhook_key.len(), WEBHOOK_KEY_LEN);
    }
}
