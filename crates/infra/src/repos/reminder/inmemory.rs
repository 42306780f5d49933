use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tickler_domain::{NewReminder, OwnerId, Reminder, ReminderId, Schedule};

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<Reminder>>,
    next_id: AtomicI64,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryReminderRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, new: &NewReminder) -> anyhow::Result<Reminder> {
        let reminder = Reminder {
            id: ReminderId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            owner_id: new.owner_id,
            text: new.text.clone(),
            schedule: new.schedule.clone(),
            active: true,
        };
        insert(&reminder, &self.reminders);
        Ok(reminder)
    }

    async fn find(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        Ok(find(reminder_id, &self.reminders))
    }

    async fn find_active_by_owner(&self, owner_id: &OwnerId) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |r| {
            r.owner_id == *owner_id && r.active
        }))
    }

    async fn find_all_active(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |r| r.active))
    }

    async fn delete_active(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        Ok(delete_first_by(&self.reminders, |r| {
            r.id == *reminder_id && r.active
        }))
    }

    async fn mark_fired(
        &self,
        reminder_id: &ReminderId,
        next: Option<DateTime<Utc>>,
    ) -> anyhow::Result<bool> {
        let mut transitioned = false;
        update_many(
            &self.reminders,
            |r| r.id == *reminder_id && r.active,
            |r| match (&mut r.schedule, next) {
                (Schedule::Recurring { next_fire_at, .. }, Some(next)) => {
                    *next_fire_at = next;
                    transitioned = true;
                }
                (Schedule::FireAt(_), None) => {
                    r.active = false;
                    transitioned = true;
                }
                _ => {}
            },
        );
        Ok(transitioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tickler_domain::WeeklyRecurrence;

    #[tokio::test]
    async fn it_matches_the_store_contract() {
        let repo = InMemoryReminderRepo::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let one_off = repo
            .insert(&NewReminder {
                owner_id: OwnerId::new(1),
                text: "a".into(),
                schedule: Schedule::FireAt(at),
            })
            .await
            .unwrap();
        let recurring = repo
            .insert(&NewReminder {
                owner_id: OwnerId::new(1),
                text: "b".into(),
                schedule: Schedule::Recurring {
                    rule: WeeklyRecurrence::new(0, 9, 0).unwrap(),
                    next_fire_at: at,
                },
            })
            .await
            .unwrap();
        assert!(one_off.id < recurring.id);

        // Fired one-offs disappear from list and cancel, recurring rows
        // keep their refreshed occurrence.
        assert!(repo.mark_fired(&one_off.id, None).await.unwrap());
        let next = at + chrono::Duration::days(7);
        assert!(repo.mark_fired(&recurring.id, Some(next)).await.unwrap());

        let listed = repo.find_active_by_owner(&OwnerId::new(1)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, recurring.id);
        assert_eq!(listed[0].schedule.next_fire_at(), next);

        assert_eq!(repo.delete_active(&one_off.id).await.unwrap(), None);
        assert!(repo.delete_active(&recurring.id).await.unwrap().is_some());
        assert_eq!(repo.delete_active(&recurring.id).await.unwrap(), None);
    }
}
