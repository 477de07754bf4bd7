// Aggregate & Poll Delta Models

use super::host::{HostName, HostResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terminal per-host outcomes accumulated over a poll session
///
/// A host is inserted at most once and never moved between sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub contacted: BTreeMap<HostName, HostResult>,
    pub dark: BTreeMap<HostName, HostResult>,
}

impl Aggregate {
    pub fn contains(&self, host: &str) -> bool {
        self.contacted.contains_key(host) || self.dark.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.contacted.len() + self.dark.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacted.is_empty() && self.dark.is_empty()
    }

    /// Count hosts per terminal outcome
    pub fn summary(&self) -> AggregateSummary {
        let failed = self
            .contacted
            .values()
            .filter(|result| result.is_failure())
            .count();
        let skipped = self
            .contacted
            .values()
            .filter(|result| result.is_skipped())
            .count();

        AggregateSummary {
            ok: self.contacted.len() - failed,
            failed,
            skipped,
            dark: self.dark.len(),
        }
    }
}

/// Host counts of an aggregate (skipped hosts are also counted as ok)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub ok: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dark: usize,
}

impl AggregateSummary {
    pub fn all_ok(&self) -> bool {
        self.failed == 0 && self.dark == 0
    }
}

/// Changes produced by a single poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollDelta {
    /// Hosts that finished during this cycle
    pub contacted: BTreeMap<HostName, HostResult>,
    /// Hosts that became unreachable during this cycle
    pub dark: BTreeMap<HostName, HostResult>,
    /// Hosts confirmed still running
    pub polled: BTreeMap<HostName, HostResult>,
}

impl PollDelta {
    pub fn is_empty(&self) -> bool {
        self.contacted.is_empty() && self.dark.is_empty() && self.polled.is_empty()
    }
}
