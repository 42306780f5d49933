use crate::error::TicklerError;
use crate::shared::usecase::UseCase;
use tickler_domain::{NewReminder, OwnerId, Reminder, Schedule};
use tickler_infra::TicklerContext;

/// Persists a new reminder. The caller is responsible for registering the
/// returned reminder's timer with the trigger queue.
#[derive(Debug)]
pub(crate) struct ScheduleReminderUseCase {
    pub owner_id: OwnerId,
    pub text: String,
    pub schedule: Schedule,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    Storage(anyhow::Error),
}

impl From<UseCaseError> for TicklerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::Storage(e) => Self::Storage(e),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleReminder";

    async fn execute(&mut self, ctx: &TicklerContext) -> Result<Self::Response, Self::Error> {
        let new = NewReminder {
            owner_id: self.owner_id,
            text: self.text.clone(),
            schedule: self.schedule.clone(),
        };
        ctx.repos
            .reminders
            .insert(&new)
            .await
            .map_err(UseCaseError::Storage)
    }
}
