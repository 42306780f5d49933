mod dispatcher;
mod error;
mod reminder;
mod shared;
mod trigger;

pub use dispatcher::{DeliveryOutcome, Dispatcher};
pub use error::TicklerError;
pub use trigger::{CancelOutcome, TriggerQueue};

use crate::reminder::{
    CancelReminderUseCase, ListRemindersUseCase, RehydrateUseCase, ScheduleReminderUseCase,
};
use crate::shared::usecase::execute;
use crate::trigger::run_trigger_loop;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tickler_domain::{OwnerId, Reminder, ReminderId, Schedule, WeeklyRecurrence};
use tickler_infra::{IMessageGateway, TicklerContext};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// The reminder scheduling engine: the create/list/cancel surface on top of
/// the store, trigger queue and dispatcher, with an explicit start/stop
/// lifecycle.
///
/// A single started `Scheduler` is the one scheduling authority: all firing
/// decisions are serialized in its trigger loop, while deliveries run on
/// spawned tasks.
pub struct Scheduler {
    ctx: TicklerContext,
    queue: Arc<TriggerQueue>,
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Sender<bool>,
    loop_handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(ctx: TicklerContext, gateway: Arc<dyn IMessageGateway>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(gateway, &ctx.config));
        let (shutdown, _) = watch::channel(false);
        Self {
            ctx,
            queue: Arc::new(TriggerQueue::new()),
            dispatcher,
            shutdown,
            loop_handle: None,
        }
    }

    /// Rebuilds timers from the store and starts the trigger loop. Must be
    /// called before reminders are expected to fire.
    pub async fn start(&mut self) -> Result<(), TicklerError> {
        let timers = execute(RehydrateUseCase, &self.ctx).await?;
        let count = timers.len();
        for (id, fire_at) in timers {
            self.queue.schedule(id, fire_at);
        }
        info!("Rehydrated {} reminder timer(s)", count);

        self.loop_handle = Some(tokio::spawn(run_trigger_loop(
            self.queue.clone(),
            self.ctx.clone(),
            self.dispatcher.clone(),
            self.shutdown.subscribe(),
        )));
        Ok(())
    }

    /// Stops the trigger loop. Reminders stay in the store and are picked
    /// up again by the next `start`.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            let _ = self.shutdown.send(true);
            let _ = handle.await;
        }
    }

    /// Registers a one-off reminder firing at `fire_at`. A fire time in the
    /// past fires immediately.
    pub async fn create_one_off(
        &self,
        owner_id: OwnerId,
        text: impl Into<String>,
        fire_at: DateTime<Utc>,
    ) -> Result<Reminder, TicklerError> {
        self.create(owner_id, text.into(), Schedule::FireAt(fire_at))
            .await
    }

    /// Registers a weekly recurring reminder. `weekday` uses the Monday=0
    /// convention; `hour` and `minute` are UTC.
    pub async fn create_recurring(
        &self,
        owner_id: OwnerId,
        text: impl Into<String>,
        weekday: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Reminder, TicklerError> {
        let rule = WeeklyRecurrence::new(weekday, hour, minute)?;
        let next_fire_at = rule.next_fire(self.ctx.sys.now());
        self.create(
            owner_id,
            text.into(),
            Schedule::Recurring { rule, next_fire_at },
        )
        .await
    }

    async fn create(
        &self,
        owner_id: OwnerId,
        text: String,
        schedule: Schedule,
    ) -> Result<Reminder, TicklerError> {
        let usecase = ScheduleReminderUseCase {
            owner_id,
            text,
            schedule,
        };
        let reminder = execute(usecase, &self.ctx).await?;
        self.queue
            .schedule(reminder.id, reminder.schedule.next_fire_at());
        Ok(reminder)
    }

    /// Active reminders for `owner_id` in creation order.
    pub async fn list(&self, owner_id: OwnerId) -> Result<Vec<Reminder>, TicklerError> {
        execute(ListRemindersUseCase { owner_id }, &self.ctx)
            .await
            .map_err(Into::into)
    }

    /// Cancels a reminder, removing its record and timer. Cancelling an id
    /// that is unknown, already cancelled or already fired (for one-offs)
    /// reports `NotFound`. A delivery already claimed by the trigger loop
    /// is not recalled.
    pub async fn cancel(&self, reminder_id: ReminderId) -> Result<Reminder, TicklerError> {
        match self.queue.cancel(&reminder_id) {
            CancelOutcome::Cancelled | CancelOutcome::NotFound => {
                execute(CancelReminderUseCase { reminder_id }, &self.ctx)
                    .await
                    .map_err(Into::into)
            }
            CancelOutcome::Firing => {
                // Lost the claim to the trigger loop. A one-off has fired
                // for good; a recurring reminder still loses its future
                // occurrences.
                let reminder = self
                    .ctx
                    .repos
                    .reminders
                    .find(&reminder_id)
                    .await
                    .map_err(TicklerError::Storage)?;
                match reminder {
                    Some(r) if r.schedule.is_recurring() => {
                        execute(CancelReminderUseCase { reminder_id }, &self.ctx)
                            .await
                            .map_err(Into::into)
                    }
                    _ => Err(TicklerError::NotFound(reminder_id)),
                }
            }
        }
    }
}
