// hostpoll Infrastructure - System Adapters
// Implements: StatusChecker, Notifier

pub mod command_status_checker;
pub mod tracing_notifier;

pub use command_status_checker::CommandStatusChecker;
pub use tracing_notifier::TracingNotifier;
