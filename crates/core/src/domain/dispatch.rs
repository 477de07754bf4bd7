// Dispatch & Status Report Models

use super::host::{HostName, HostResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of the initial fire-and-forget dispatch
///
/// Produced by whatever launched the job: hosts that answered (started,
/// finished synchronously, or skipped) and hosts that were unreachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    #[serde(default)]
    pub contacted: BTreeMap<HostName, HostResult>,
    #[serde(default)]
    pub dark: BTreeMap<HostName, HostResult>,
}

impl DispatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dispatch outcome from its JSON form
    pub fn from_json_str(s: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn with_contacted(mut self, host: impl Into<HostName>, result: impl Into<HostResult>) -> Self {
        self.contacted.insert(host.into(), result.into());
        self
    }

    pub fn with_dark(mut self, host: impl Into<HostName>, result: impl Into<HostResult>) -> Self {
        self.dark.insert(host.into(), result.into());
        self
    }

    pub fn host_count(&self) -> usize {
        self.contacted.len() + self.dark.len()
    }
}

/// Raw answer of one status-check call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub contacted: BTreeMap<HostName, HostResult>,
    #[serde(default)]
    pub dark: BTreeMap<HostName, HostResult>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report marking every given host unreachable with the same message
    pub fn unreachable<'a>(hosts: impl IntoIterator<Item = &'a HostName>, msg: &str) -> Self {
        Self {
            contacted: BTreeMap::new(),
            dark: hosts
                .into_iter()
                .map(|host| (host.clone(), HostResult::unreachable(msg)))
                .collect(),
        }
    }

    pub fn with_contacted(mut self, host: impl Into<HostName>, result: impl Into<HostResult>) -> Self {
        self.contacted.insert(host.into(), result.into());
        self
    }

    pub fn with_dark(mut self, host: impl Into<HostName>, result: impl Into<HostResult>) -> Self {
        self.dark.insert(host.into(), result.into());
        self
    }
}
