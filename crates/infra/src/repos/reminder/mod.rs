mod inmemory;
mod sqlite;

pub use inmemory::InMemoryReminderRepo;
pub use sqlite::SqliteReminderRepo;

use chrono::{DateTime, Utc};
use tickler_domain::{NewReminder, OwnerId, Reminder, ReminderId};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    /// Persists a new reminder and assigns its id. Ids are unique and
    /// monotonically increasing.
    async fn insert(&self, new: &NewReminder) -> anyhow::Result<Reminder>;
    async fn find(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>>;
    /// Active reminders for `owner_id` in creation order.
    async fn find_active_by_owner(&self, owner_id: &OwnerId) -> anyhow::Result<Vec<Reminder>>;
    async fn find_all_active(&self) -> anyhow::Result<Vec<Reminder>>;
    /// Deletes the row behind `reminder_id` if it is still active. `None`
    /// means there was nothing left to cancel.
    async fn delete_active(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>>;
    /// Applies the post-fire transition: recurring reminders store the
    /// newly computed `next` occurrence, one-off reminders become inactive.
    /// Returns false when no active row was left to transition, in which
    /// case the caller must not re-arm a timer.
    async fn mark_fired(
        &self,
        reminder_id: &ReminderId,
        next: Option<DateTime<Utc>>,
    ) -> anyhow::Result<bool>;
}
