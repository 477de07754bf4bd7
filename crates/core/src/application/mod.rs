// Application Layer - Use Cases

pub mod poller;

// Re-exports
pub use poller::{cancel_channel, AsyncPoller, CancelSender, CancelToken};
