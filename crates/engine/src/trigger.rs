use crate::dispatcher::Dispatcher;
use crate::reminder::{FireReminderUseCase, FiredReminder};
use crate::shared::usecase::execute;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex};
use tickler_domain::ReminderId;
use tickler_infra::TicklerContext;
use tokio::sync::{watch, Notify};
use tracing::error;

/// Outcome of trying to cancel a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The pending timer was removed before it could fire.
    Cancelled,
    /// The timer was already claimed for firing. The delivery can no longer
    /// be prevented, but a later re-arm is suppressed.
    Firing,
    /// No timer is registered for this id.
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerEntry {
    fire_at: DateTime<Utc>,
    id: ReminderId,
    token: u64,
}

enum TimerSlot {
    Pending { token: u64 },
    Firing { cancelled: bool },
}

#[derive(Default)]
struct QueueInner {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    slots: HashMap<ReminderId, TimerSlot>,
    next_token: u64,
}

impl QueueInner {
    fn arm(&mut self, id: ReminderId, fire_at: DateTime<Utc>) {
        let token = self.next_token;
        self.next_token += 1;
        self.slots.insert(id, TimerSlot::Pending { token });
        self.heap.push(Reverse(TimerEntry { fire_at, id, token }));
    }

    fn is_live(&self, entry: &TimerEntry) -> bool {
        matches!(
            self.slots.get(&entry.id),
            Some(TimerSlot::Pending { token }) if *token == entry.token
        )
    }
}

/// The priority structure behind the trigger loop: at most one live timer
/// per reminder id, ordered by fire timestamp.
///
/// The pending-to-firing transition and `cancel` contend on a single lock,
/// so for any id exactly one of the two wins. Replaced and cancelled heap
/// entries are invalidated by token and skipped lazily when popped.
pub struct TriggerQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            notify: Notify::new(),
        }
    }

    /// Registers a timer for `id`, replacing any existing one, and wakes
    /// the trigger loop.
    pub fn schedule(&self, id: ReminderId, fire_at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        inner.arm(id, fire_at);
        drop(inner);
        self.notify.notify_one();
    }

    pub fn cancel(&self, id: &ReminderId) -> CancelOutcome {
        let mut inner = self.inner.lock().unwrap();
        match inner.slots.get_mut(id) {
            Some(TimerSlot::Pending { .. }) => {
                inner.slots.remove(id);
                CancelOutcome::Cancelled
            }
            Some(TimerSlot::Firing { cancelled }) => {
                *cancelled = true;
                CancelOutcome::Firing
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Pops every timer due at `now` in non-decreasing fire-timestamp
    /// order, claiming each for firing. A claimed id stays occupied until
    /// `complete` is called for it.
    pub fn claim_due(&self, now: DateTime<Utc>) -> Vec<ReminderId> {
        let mut inner = self.inner.lock().unwrap();
        let mut due = Vec::new();
        while let Some(&Reverse(entry)) = inner.heap.peek() {
            if entry.fire_at > now {
                break;
            }
            inner.heap.pop();
            if inner.is_live(&entry) {
                inner
                    .slots
                    .insert(entry.id, TimerSlot::Firing { cancelled: false });
                due.push(entry.id);
            }
        }
        due
    }

    /// Finishes a firing claimed by `claim_due`, re-arming the timer at
    /// `rearm_at` unless the reminder was cancelled mid-fire.
    pub fn complete(&self, id: ReminderId, rearm_at: Option<DateTime<Utc>>) {
        let mut inner = self.inner.lock().unwrap();
        let cancelled = matches!(
            inner.slots.get(&id),
            Some(TimerSlot::Firing { cancelled: true })
        );
        inner.slots.remove(&id);
        if cancelled {
            return;
        }
        if let Some(fire_at) = rearm_at {
            inner.arm(id, fire_at);
            drop(inner);
            self.notify.notify_one();
        }
    }

    /// Earliest pending fire time, if any.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        let mut inner = self.inner.lock().unwrap();
        while let Some(&Reverse(entry)) = inner.heap.peek() {
            if inner.is_live(&entry) {
                return Some(entry.fire_at);
            }
            // Drop stale heads so the loop never sleeps on a dead timer.
            inner.heap.pop();
        }
        None
    }

    /// Resolves on the next schedule or re-arm wake-up.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Default for TriggerQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// How long a claimed timer is pushed back when the store cannot be read
/// or transitioned during its firing.
const FIRE_RETRY_DELAY_SECS: i64 = 60;

/// The single scheduling authority: claims due timers in order, applies the
/// store transition for each and hands delivery to the dispatcher on a
/// spawned task, then sleeps until the next deadline or an early wake-up
/// from `schedule`/re-arm.
pub(crate) async fn run_trigger_loop(
    queue: Arc<TriggerQueue>,
    ctx: TicklerContext,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let now = ctx.sys.now();
        for id in queue.claim_due(now) {
            match execute(FireReminderUseCase { reminder_id: id }, &ctx).await {
                Ok(Some(FiredReminder { reminder, rearm_at })) => {
                    queue.complete(id, rearm_at);
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch(&reminder).await;
                    });
                }
                Ok(None) => {
                    queue.complete(id, None);
                }
                Err(e) => {
                    // Storage hiccup: keep the timer and try again shortly.
                    error!("Failed to fire reminder {}: {:?}", id, e);
                    queue.complete(id, Some(now + chrono::Duration::seconds(FIRE_RETRY_DELAY_SECS)));
                }
            }
        }

        let sleep_for = queue
            .next_deadline()
            .map(|deadline| (deadline - ctx.sys.now()).to_std().unwrap_or_default());
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = queue.notified() => {}
            _ = sleep_until_deadline(sleep_for) => {}
        }
    }
}

async fn sleep_until_deadline(sleep_for: Option<std::time::Duration>) {
    match sleep_for {
        Some(sleep_for) => tokio::time::sleep(sleep_for).await,
        None => std::future::pending().await,
    }
}
