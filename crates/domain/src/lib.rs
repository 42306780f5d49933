mod entity;
mod recurrence;
mod reminder;

pub use entity::{Entity, InvalidIdError, OwnerId, ReminderId};
pub use recurrence::{InvalidSchedule, WeeklyRecurrence};
pub use reminder::{NewReminder, Reminder, Schedule};
