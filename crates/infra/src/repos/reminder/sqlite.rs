use super::IReminderRepo;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tickler_domain::{NewReminder, OwnerId, Reminder, ReminderId, Schedule, WeeklyRecurrence};

pub struct SqliteReminderRepo {
    pool: SqlitePool,
}

impl SqliteReminderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    id: i64,
    owner_id: i64,
    text: String,
    fire_at: Option<String>,
    recurrence: Option<String>,
    active: bool,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> Result<Self, Self::Error> {
        let fire_at = raw
            .fire_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .with_context(|| format!("reminder {} has a malformed fire_at", raw.id))?;
        let schedule = match raw.recurrence.as_deref() {
            Some(descriptor) => {
                let rule = descriptor.parse::<WeeklyRecurrence>()?;
                let next_fire_at = fire_at.ok_or_else(|| {
                    anyhow!("recurring reminder {} has no stored next occurrence", raw.id)
                })?;
                Schedule::Recurring { rule, next_fire_at }
            }
            None => {
                let at = fire_at
                    .ok_or_else(|| anyhow!("reminder {} has neither fire_at nor recurrence", raw.id))?;
                Schedule::FireAt(at)
            }
        };
        Ok(Reminder {
            id: ReminderId::new(raw.id),
            owner_id: OwnerId::new(raw.owner_id),
            text: raw.text,
            schedule,
            active: raw.active,
        })
    }
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn schedule_columns(schedule: &Schedule) -> (String, Option<String>) {
    let fire_at = schedule.next_fire_at().to_rfc3339();
    let recurrence = match schedule {
        Schedule::FireAt(_) => None,
        Schedule::Recurring { rule, .. } => Some(rule.to_string()),
    };
    (fire_at, recurrence)
}

const REMINDER_COLUMNS: &str = "id, owner_id, text, fire_at, recurrence, active";

#[async_trait::async_trait]
impl IReminderRepo for SqliteReminderRepo {
    async fn insert(&self, new: &NewReminder) -> anyhow::Result<Reminder> {
        let (fire_at, recurrence) = schedule_columns(&new.schedule);
        let res = sqlx::query(
            r#"
            INSERT INTO reminders (owner_id, text, fire_at, recurrence, active)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
        )
        .bind(new.owner_id.inner())
        .bind(new.text.as_str())
        .bind(fire_at)
        .bind(recurrence)
        .execute(&self.pool)
        .await?;
        Ok(Reminder {
            id: ReminderId::new(res.last_insert_rowid()),
            owner_id: new.owner_id,
            text: new.text.clone(),
            schedule: new.schedule.clone(),
            active: true,
        })
    }

    async fn find(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        let raw: Option<ReminderRaw> = sqlx::query_as(&format!(
            "SELECT {} FROM reminders WHERE id = ?1",
            REMINDER_COLUMNS
        ))
        .bind(reminder_id.inner())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(Reminder::try_from).transpose()
    }

    async fn find_active_by_owner(&self, owner_id: &OwnerId) -> anyhow::Result<Vec<Reminder>> {
        let raws: Vec<ReminderRaw> = sqlx::query_as(&format!(
            "SELECT {} FROM reminders WHERE owner_id = ?1 AND active = 1 ORDER BY id ASC",
            REMINDER_COLUMNS
        ))
        .bind(owner_id.inner())
        .fetch_all(&self.pool)
        .await?;
        raws.into_iter().map(Reminder::try_from).collect()
    }

    async fn find_all_active(&self) -> anyhow::Result<Vec<Reminder>> {
        let raws: Vec<ReminderRaw> = sqlx::query_as(&format!(
            "SELECT {} FROM reminders WHERE active = 1 ORDER BY id ASC",
            REMINDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        raws.into_iter().map(Reminder::try_from).collect()
    }

    async fn delete_active(&self, reminder_id: &ReminderId) -> anyhow::Result<Option<Reminder>> {
        let raw: Option<ReminderRaw> = sqlx::query_as(&format!(
            "DELETE FROM reminders WHERE id = ?1 AND active = 1 RETURNING {}",
            REMINDER_COLUMNS
        ))
        .bind(reminder_id.inner())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(Reminder::try_from).transpose()
    }

    async fn mark_fired(
        &self,
        reminder_id: &ReminderId,
        next: Option<DateTime<Utc>>,
    ) -> anyhow::Result<bool> {
        let res = match next {
            Some(next) => {
                sqlx::query(
                    r#"
                    UPDATE reminders SET fire_at = ?2
                    WHERE id = ?1 AND active = 1 AND recurrence IS NOT NULL
                    "#,
                )
                .bind(reminder_id.inner())
                .bind(next.to_rfc3339())
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE reminders SET active = 0
                    WHERE id = ?1 AND active = 1 AND recurrence IS NULL
                    "#,
                )
                .bind(reminder_id.inner())
                .execute(&self.pool)
                .await?
            }
        };
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::Repos;
    use chrono::{Duration, TimeZone};

    async fn setup() -> Repos {
        Repos::create_sqlite("sqlite::memory:")
            .await
            .expect("in-memory sqlite to be available")
    }

    fn one_off(owner: i64, text: &str, fire_at: DateTime<Utc>) -> NewReminder {
        NewReminder {
            owner_id: OwnerId::new(owner),
            text: text.into(),
            schedule: Schedule::FireAt(fire_at),
        }
    }

    fn recurring(owner: i64, text: &str, next_fire_at: DateTime<Utc>) -> NewReminder {
        NewReminder {
            owner_id: OwnerId::new(owner),
            text: text.into(),
            schedule: Schedule::Recurring {
                rule: WeeklyRecurrence::new(4, 18, 30).unwrap(),
                next_fire_at,
            },
        }
    }

    #[tokio::test]
    async fn it_assigns_monotonic_ids_and_lists_in_creation_order() {
        let repos = setup().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let first = repos.reminders.insert(&one_off(1, "a", at)).await.unwrap();
        let second = repos.reminders.insert(&recurring(1, "b", at)).await.unwrap();
        let other_owner = repos.reminders.insert(&one_off(2, "c", at)).await.unwrap();
        assert!(first.id < second.id);
        assert!(second.id < other_owner.id);

        let listed = repos
            .reminders
            .find_active_by_owner(&OwnerId::new(1))
            .await
            .unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn it_round_trips_both_schedule_variants() {
        let repos = setup().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let one_off = repos.reminders.insert(&one_off(7, "stretch", at)).await.unwrap();
        let recurring = repos
            .reminders
            .insert(&recurring(7, "trash", at + Duration::days(3)))
            .await
            .unwrap();

        let found = repos.reminders.find(&one_off.id).await.unwrap();
        assert_eq!(found, Some(one_off));
        let found = repos.reminders.find(&recurring.id).await.unwrap();
        assert_eq!(found, Some(recurring));
    }

    #[tokio::test]
    async fn second_cancel_reports_nothing_to_cancel() {
        let repos = setup().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let reminder = repos.reminders.insert(&one_off(1, "a", at)).await.unwrap();

        let deleted = repos.reminders.delete_active(&reminder.id).await.unwrap();
        assert_eq!(deleted, Some(reminder.clone()));
        let deleted = repos.reminders.delete_active(&reminder.id).await.unwrap();
        assert_eq!(deleted, None);
    }

    #[tokio::test]
    async fn mark_fired_deactivates_one_off_reminders() {
        let repos = setup().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let reminder = repos.reminders.insert(&one_off(1, "a", at)).await.unwrap();

        assert!(repos.reminders.mark_fired(&reminder.id, None).await.unwrap());

        let found = repos.reminders.find(&reminder.id).await.unwrap().unwrap();
        assert!(!found.active);
        // A fired one-off is invisible to list and cancel.
        assert!(repos
            .reminders
            .find_active_by_owner(&OwnerId::new(1))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repos.reminders.delete_active(&reminder.id).await.unwrap(),
            None
        );
        // The transition is terminal.
        assert!(!repos.reminders.mark_fired(&reminder.id, None).await.unwrap());
    }

    #[tokio::test]
    async fn mark_fired_stores_next_occurrence_for_recurring_reminders() {
        let repos = setup().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();
        let reminder = repos.reminders.insert(&recurring(1, "trash", at)).await.unwrap();

        let next = at + Duration::days(7);
        assert!(repos
            .reminders
            .mark_fired(&reminder.id, Some(next))
            .await
            .unwrap());

        let found = repos.reminders.find(&reminder.id).await.unwrap().unwrap();
        assert!(found.active);
        assert_eq!(found.schedule.next_fire_at(), next);
        assert!(found.schedule.is_recurring());
    }

    #[tokio::test]
    async fn mark_fired_on_missing_row_reports_no_transition() {
        let repos = setup().await;
        assert!(!repos
            .reminders
            .mark_fired(&ReminderId::new(99), None)
            .await
            .unwrap());
    }
}
