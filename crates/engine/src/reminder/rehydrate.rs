use crate::error::TicklerError;
use crate::shared::usecase::UseCase;
use chrono::{DateTime, Utc};
use tickler_domain::{ReminderId, Schedule};
use tickler_infra::TicklerContext;

/// Rebuilds the timer set from persisted state after a restart.
///
/// One-off reminders keep their stored fire time, so one that came due
/// while the process was down fires immediately, exactly once. A recurring
/// reminder whose stored occurrence went stale gets a fresh one computed
/// and persisted; occurrences missed during downtime are skipped, not
/// replayed.
#[derive(Debug)]
pub(crate) struct RehydrateUseCase;

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
impl UseCase for RehydrateUseCase {
    type Response = Vec<(ReminderId, DateTime<Utc>)>;

    type Error = UseCaseError;

    const NAME: &'static str = "Rehydrate";

    async fn execute(&mut self, ctx: &TicklerContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.now();
        let reminders = ctx
            .repos
            .reminders
            .find_all_active()
            .await
            .map_err(UseCaseError::Storage)?;

        let mut timers = Vec::with_capacity(reminders.len());
        for reminder in reminders {
            let fire_at = match &reminder.schedule {
                Schedule::FireAt(at) => *at,
                Schedule::Recurring { rule, next_fire_at } if *next_fire_at <= now => {
                    let next = rule.next_fire(now);
                    ctx.repos
                        .reminders
                        .mark_fired(&reminder.id, Some(next))
                        .await
                        .map_err(UseCaseError::Storage)?;
                    next
                }
                Schedule::Recurring { next_fire_at, .. } => *next_fire_at,
            };
            timers.push((reminder.id, fire_at));
        }
        Ok(timers)
    }
}
