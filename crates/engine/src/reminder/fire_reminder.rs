use crate::error::TicklerError;
use crate::shared::usecase::UseCase;
use chrono::{DateTime, Utc};
use tickler_domain::{Reminder, ReminderId, Schedule};
use tickler_infra::TicklerContext;

/// Applies the store-side transition for a reminder whose timer was just
/// claimed: one-off reminders become inactive, recurring reminders get the
/// next occurrence computed and stored.
///
/// Responds with `None` when there is nothing to deliver: the row is gone
/// or already inactive, or it was cancelled between the claim and the
/// transition.
#[derive(Debug)]
pub(crate) struct FireReminderUseCase {
    pub reminder_id: ReminderId,
}

/// A claimed reminder ready for dispatch. `rearm_at` carries the next
/// occurrence when the reminder is recurring.
#[derive(Debug)]
pub(crate) struct FiredReminder {
    pub reminder: Reminder,
    pub rearm_at: Option<DateTime<Utc>>,
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
impl UseCase for FireReminderUseCase {
    type Response = Option<FiredReminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "FireReminder";

    async fn execute(&mut self, ctx: &TicklerContext) -> Result<Self::Response, Self::Error> {
        let reminder = ctx
            .repos
            .reminders
            .find(&self.reminder_id)
            .await
            .map_err(UseCaseError::Storage)?;
        let reminder = match reminder {
            Some(reminder) if reminder.active => reminder,
            _ => return Ok(None),
        };

        let rearm_at = match &reminder.schedule {
            Schedule::FireAt(_) => None,
            Schedule::Recurring { rule, .. } => Some(rule.next_fire(ctx.sys.now())),
        };
        let transitioned = ctx
            .repos
            .reminders
            .mark_fired(&self.reminder_id, rearm_at)
            .await
            .map_err(UseCaseError::Storage)?;
        if !transitioned {
            // Lost the row to a concurrent cancel.
            return Ok(None);
        }

        Ok(Some(FiredReminder { reminder, rearm_at }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::usecase::execute;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tickler_domain::{NewReminder, OwnerId, WeeklyRecurrence};
    use tickler_infra::ISys;

    struct StaticTimeSys(DateTime<Utc>);
    impl ISys for StaticTimeSys {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn ctx_at(now: DateTime<Utc>) -> TicklerContext {
        let mut ctx = TicklerContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(now));
        ctx
    }

    #[tokio::test]
    async fn firing_a_one_off_deactivates_it_once() {
        let now = Utc.with_ymd_and_hms(2021, 2, 22, 18, 30, 0).unwrap();
        let ctx = ctx_at(now);
        let reminder = ctx
            .repos
            .reminders
            .insert(&NewReminder {
                owner_id: OwnerId::new(1),
                text: "water plants".into(),
                schedule: Schedule::FireAt(now),
            })
            .await
            .unwrap();

        let fired = execute(
            FireReminderUseCase {
                reminder_id: reminder.id,
            },
            &ctx,
        )
        .await
        .unwrap()
        .expect("an active one-off to fire");
        assert_eq!(fired.reminder.text, "water plants");
        assert_eq!(fired.rearm_at, None);

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap().unwrap();
        assert!(!stored.active);

        // A second claim for the same id finds nothing to do.
        let fired = execute(
            FireReminderUseCase {
                reminder_id: reminder.id,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert!(fired.is_none());
    }

    #[tokio::test]
    async fn firing_a_recurring_reminder_rearms_it_for_next_week() {
        // Monday 18:30 rule firing exactly at Monday 18:30.
        let now = Utc.with_ymd_and_hms(2021, 2, 22, 18, 30, 0).unwrap();
        let ctx = ctx_at(now);
        let rule = WeeklyRecurrence::new(0, 18, 30).unwrap();
        let reminder = ctx
            .repos
            .reminders
            .insert(&NewReminder {
                owner_id: OwnerId::new(1),
                text: "trash".into(),
                schedule: Schedule::Recurring {
                    rule,
                    next_fire_at: now,
                },
            })
            .await
            .unwrap();

        let fired = execute(
            FireReminderUseCase {
                reminder_id: reminder.id,
            },
            &ctx,
        )
        .await
        .unwrap()
        .expect("an active recurring reminder to fire");
        let next_week = Utc.with_ymd_and_hms(2021, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(fired.rearm_at, Some(next_week));

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap().unwrap();
        assert!(stored.active);
        assert_eq!(stored.schedule.next_fire_at(), next_week);
    }

    #[tokio::test]
    async fn firing_an_unknown_or_cancelled_id_is_a_no_op() {
        let now = Utc.with_ymd_and_hms(2021, 2, 22, 18, 30, 0).unwrap();
        let ctx = ctx_at(now);
        let fired = execute(
            FireReminderUseCase {
                reminder_id: ReminderId::new(42),
            },
            &ctx,
        )
        .await
        .unwrap();
        assert!(fired.is_none());
    }
}
