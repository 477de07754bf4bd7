// Domain Error Types

use super::host::JobId;
use thiserror::Error;

/// Inconsistencies in a dispatch outcome (collaborator contract violations)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unexpected error: unable to determine job id (hosts returned results but none started)")]
    UndeterminedJobId,

    #[error("unexpected error: host {host} started without a job id")]
    MissingJobId { host: String },

    #[error("unexpected error: host {host} reported job id {found}, expected {expected}")]
    JobIdMismatch {
        host: String,
        expected: JobId,
        found: JobId,
    },

    #[error("unexpected error: host {host} reported both as contacted and as unreachable")]
    HostInBothSections { host: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
