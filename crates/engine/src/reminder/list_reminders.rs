use crate::error::TicklerError;
use crate::shared::usecase::UseCase;
use tickler_domain::{OwnerId, Reminder};
use tickler_infra::TicklerContext;

/// Active reminders for one owner in creation order. Cancelled rows and
/// fired one-offs never show up.
#[derive(Debug)]
pub(crate) struct ListRemindersUseCase {
    pub owner_id: OwnerId,
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
impl UseCase for ListRemindersUseCase {
    type Response = Vec<Reminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "ListReminders";

    async fn execute(&mut self, ctx: &TicklerContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .reminders
            .find_active_by_owner(&self.owner_id)
            .await
            .map_err(UseCaseError::Storage)
    }
}
