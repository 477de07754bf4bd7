// Domain Layer - Pure polling state and entities

pub mod aggregate;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod session;

// Re-exports
pub use aggregate::{Aggregate, AggregateSummary, PollDelta};
pub use dispatch::{DispatchOutcome, StatusReport};
pub use error::DomainError;
pub use host::{HostName, HostResult, JobId};
pub use session::{CycleOutcome, PollSession};
