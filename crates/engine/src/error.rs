use thiserror::Error;
use tickler_domain::{InvalidSchedule, ReminderId};

#[derive(Error, Debug)]
pub enum TicklerError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(#[from] InvalidSchedule),
    #[error("Reminder with id: {0}, was not found")]
    NotFound(ReminderId),
    #[error("Storage failure: {0}")]
    Storage(anyhow::Error),
}
