//! 业务逻辑层（Service）

mod alert_store;
mod email_service;
mod notification_channel;
mod notification_dispatcher;
mod reading_generator;
mod recipient_resolver;
mod simulation_scheduler;
mod threshold_evaluator;

pub use alert_store::{AlertStore, StoreStats};
pub use email_service::EmailService;
pub use notification_channel::{LogChannel, NotificationChannel};
pub use notification_dispatcher::NotificationDispatcher;
pub use reading_generator::{GeneratorConfig, ReadingGenerator};
pub use recipient_resolver::{filter_recipients, RecipientResolver};
pub use simulation_scheduler::{PipelineComponents, SchedulerConfig, SimulationScheduler};
pub use threshold_evaluator::{ThresholdEvaluator, LOW_BATTERY_THRESHOLD};
