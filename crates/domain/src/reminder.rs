use crate::entity::{Entity, OwnerId, ReminderId};
use crate::recurrence::WeeklyRecurrence;
use chrono::{DateTime, Utc};

/// When a `Reminder` is due to trigger delivery. Exactly one variant
/// describes a reminder at any point in its life.
///
/// Recurring reminders carry the next occurrence computed from their rule;
/// persisting it lets startup recovery detect schedules that went stale
/// while the process was down.
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    /// One-off, absolute point in time.
    FireAt(DateTime<Utc>),
    /// Weekly rule plus its next computed occurrence.
    Recurring {
        rule: WeeklyRecurrence,
        next_fire_at: DateTime<Utc>,
    },
}

impl Schedule {
    /// The next timestamp at which this schedule is due.
    pub fn next_fire_at(&self) -> DateTime<Utc> {
        match self {
            Schedule::FireAt(at) => *at,
            Schedule::Recurring { next_fire_at, .. } => *next_fire_at,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Schedule::Recurring { .. })
    }
}

/// A `Reminder` is a text payload that should be delivered to its owner
/// when its schedule fires.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner_id: OwnerId,
    pub text: String,
    pub schedule: Schedule,
    /// False only for one-off reminders that already fired, which is
    /// terminal. Recurring reminders stay active until cancelled, which
    /// removes the record entirely.
    pub active: bool,
}

impl Entity for Reminder {
    fn id(&self) -> &ReminderId {
        &self.id
    }
}

/// A reminder as submitted for creation, before the store has assigned
/// its id.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner_id: OwnerId,
    pub text: String,
    pub schedule: Schedule,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn schedule_reports_next_fire_for_both_variants() {
        let at = Utc.with_ymd_and_hms(2021, 2, 26, 18, 30, 0).unwrap();
        assert_eq!(Schedule::FireAt(at).next_fire_at(), at);

        let rule = WeeklyRecurrence::new(4, 18, 30).unwrap();
        let schedule = Schedule::Recurring {
            rule,
            next_fire_at: at,
        };
        assert_eq!(schedule.next_fire_at(), at);
        assert!(schedule.is_recurring());
        assert!(!Schedule::FireAt(at).is_recurring());
    }
}
