// Port Layer - Interfaces for external collaborators

pub mod notifier;
pub mod status_checker;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use notifier::Notifier;
pub use status_checker::{StatusCheckError, StatusChecker};
pub use time_provider::TimeProvider;
