pub mod reminder_worker;

pub use reminder_worker::ReminderWorker;
