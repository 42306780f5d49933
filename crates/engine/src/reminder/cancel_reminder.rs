use crate::error::TicklerError;
use crate::shared::usecase::UseCase;
use tickler_domain::{Reminder, ReminderId};
use tickler_infra::TicklerContext;

/// Deletes a reminder that is still active. Cancelling an id that is
/// unknown, already cancelled or already fired reports `NotFound` instead
/// of silently succeeding.
#[derive(Debug)]
pub(crate) struct CancelReminderUseCase {
    pub reminder_id: ReminderId,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    NotFound(ReminderId),
    Storage(anyhow::Error),
}

impl From<UseCaseError> for TicklerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(reminder_id) => Self::NotFound(reminder_id),
            UseCaseError::Storage(e) => Self::Storage(e),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CancelReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelReminder";

    async fn execute(&mut self, ctx: &TicklerContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.reminders.delete_active(&self.reminder_id).await {
            Ok(Some(reminder)) => Ok(reminder),
            Ok(None) => Err(UseCaseError::NotFound(self.reminder_id)),
            Err(e) => Err(UseCaseError::Storage(e)),
        }
    }
}
