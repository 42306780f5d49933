use std::sync::Arc;
use std::time::Duration;
use tickler_domain::Reminder;
use tickler_infra::{Config, IMessageGateway};
use tokio::time::{sleep, timeout};
use tracing::{error, warn};

/// Result of the delivery attempts for a single firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed,
}

/// Performs the actual notification attempts, decoupled from the trigger
/// loop so a slow or failing delivery never delays other reminders.
///
/// Failed attempts are retried with exponential backoff up to the
/// configured bound. Giving up is logged and never touches scheduling
/// state: a recurring reminder continues on schedule regardless of past
/// delivery failures.
pub struct Dispatcher {
    gateway: Arc<dyn IMessageGateway>,
    max_attempts: u32,
    retry_backoff: Duration,
    attempt_timeout: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn IMessageGateway>, config: &Config) -> Self {
        Self {
            gateway,
            max_attempts: config.delivery_max_attempts,
            retry_backoff: config.delivery_retry_backoff,
            attempt_timeout: config.delivery_attempt_timeout,
        }
    }

    pub async fn deliver(&self, reminder: &Reminder) -> DeliveryOutcome {
        let mut backoff = self.retry_backoff;
        for attempt in 1..=self.max_attempts {
            match timeout(
                self.attempt_timeout,
                self.gateway.send(&reminder.owner_id, &reminder.text),
            )
            .await
            {
                Ok(Ok(())) => return DeliveryOutcome::Delivered,
                Ok(Err(e)) => {
                    warn!(
                        "Delivery attempt {} for reminder {} failed: {}",
                        attempt, reminder.id, e
                    );
                }
                Err(_) => {
                    warn!(
                        "Delivery attempt {} for reminder {} timed out",
                        attempt, reminder.id
                    );
                }
            }
            if attempt < self.max_attempts {
                sleep(backoff).await;
                backoff *= 2;
            }
        }
        DeliveryOutcome::Failed
    }

    /// Entry point used by the trigger loop on a spawned task.
    pub async fn dispatch(&self, reminder: &Reminder) {
        if self.deliver(reminder).await == DeliveryOutcome::Failed {
            error!(
                "Giving up on delivering reminder {} to owner {}",
                reminder.id, reminder.owner_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tickler_domain::{OwnerId, ReminderId, Schedule};
    use tickler_infra::InMemoryMessageGateway;

    fn test_config() -> Config {
        Config {
            webhook_url: None,
            webhook_key: "test-key".into(),
            delivery_max_attempts: 3,
            delivery_retry_backoff: Duration::from_millis(5),
            delivery_attempt_timeout: Duration::from_millis(200),
        }
    }

    fn reminder() -> Reminder {
        Reminder {
            id: ReminderId::new(1),
            owner_id: OwnerId::new(7),
            text: "water plants".into(),
            schedule: Schedule::FireAt(Utc.with_ymd_and_hms(2021, 2, 21, 0, 0, 0).unwrap()),
            active: true,
        }
    }

    #[tokio::test]
    async fn it_retries_transient_failures_until_delivery() {
        let gateway = Arc::new(InMemoryMessageGateway::failing(2));
        let dispatcher = Dispatcher::new(gateway.clone(), &test_config());

        let outcome = dispatcher.deliver(&reminder()).await;
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(
            gateway.sent(),
            vec![(OwnerId::new(7), "water plants".to_string())]
        );
    }

    #[tokio::test]
    async fn it_gives_up_after_the_attempt_bound() {
        let gateway = Arc::new(InMemoryMessageGateway::failing(u32::MAX));
        let dispatcher = Dispatcher::new(gateway.clone(), &test_config());

        let outcome = dispatcher.deliver(&reminder()).await;
        assert_eq!(outcome, DeliveryOutcome::Failed);
        assert!(gateway.sent().is_empty());
    }
}
