mod cancel_reminder;
mod fire_reminder;
mod list_reminders;
mod rehydrate;
mod schedule_reminder;

pub(crate) use cancel_reminder::CancelReminderUseCase;
pub(crate) use fire_reminder::{FireReminderUseCase, FiredReminder};
pub(crate) use list_reminders::ListRemindersUseCase;
pub(crate) use rehydrate::RehydrateUseCase;
pub(crate) use schedule_reminder::ScheduleReminderUseCase;
