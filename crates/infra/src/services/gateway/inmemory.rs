use super::{GatewayError, IMessageGateway};
use std::sync::Mutex;
use tickler_domain::OwnerId;

/// Records deliveries instead of performing them. Tests can script a number
/// of failing attempts to exercise retry handling.
pub struct InMemoryMessageGateway {
    sent: Mutex<Vec<(OwnerId, String)>>,
    failures_left: Mutex<u32>,
}

impl InMemoryMessageGateway {
    pub fn new() -> Self {
        Self::failing(0)
    }

    /// The first `failures` send attempts fail before deliveries succeed.
    /// Pass `u32::MAX` for a gateway that never delivers.
    pub fn failing(failures: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: Mutex::new(failures),
        }
    }

    pub fn sent(&self) -> Vec<(OwnerId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryMessageGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IMessageGateway for InMemoryMessageGateway {
    async fn send(&self, recipient: &OwnerId, text: &str) -> Result<(), GatewayError> {
        {
            let mut failures_left = self.failures_left.lock().unwrap();
            if *failures_left > 0 {
                *failures_left = failures_left.saturating_sub(1);
                return Err(GatewayError::Refused("scripted transient failure".into()));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((*recipient, text.to_string()));
        Ok(())
    }
}
