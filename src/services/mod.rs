pub mod alert_service;
pub mod dispatcher;
pub mod notification;

#[cfg(test)]
mod notification_tests;

pub use alert_service::{AlertService, SubmitOutcome};
pub use dispatcher::{Dispatcher, SymbolWorker};
pub use notification::{LogNotifier, NotificationService, Notifier, TelegramNotifier};
