// Host Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Host name as known to the inventory
pub type HostName = String;

/// Result key: job accepted and still running
pub const STARTED_KEY: &str = "started";
/// Result key: host skipped at dispatch
pub const SKIPPED_KEY: &str = "skipped";
/// Result key: job failed on the host
pub const FAILED_KEY: &str = "failed";
/// Result key: remote return code
pub const RC_KEY: &str = "rc";
/// Result key: asynchronous job identifier
pub const JOB_ID_KEY: &str = "job_id";
/// Result key: job identifier as written by Ansible-style dispatchers
pub const ANSIBLE_JOB_ID_KEY: &str = "ansible_job_id";

/// Job ID shared by every host that accepted the same dispatched job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host Result (opaque JSON object reported by a host)
///
/// Only a handful of keys carry meaning for polling; everything else is
/// passed through untouched to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostResult(Value);

impl HostResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Result synthesized for a host that could not be reached
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self(json!({
            "failed": true,
            "unreachable": true,
            "msg": msg.into(),
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Job accepted and not finished yet
    pub fn is_started(&self) -> bool {
        self.flag(STARTED_KEY)
    }

    pub fn is_skipped(&self) -> bool {
        self.flag(SKIPPED_KEY)
    }

    /// Failure flag set, or a return code other than zero
    pub fn is_failure(&self) -> bool {
        self.flag(FAILED_KEY) || self.rc_is_nonzero()
    }

    /// Return code, when reported as an integer (or an integer string)
    pub fn rc(&self) -> Option<i64> {
        match self.0.get(RC_KEY)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Job identifier under `job_id` or `ansible_job_id`, as string or integer
    pub fn job_id(&self) -> Option<JobId> {
        [JOB_ID_KEY, ANSIBLE_JOB_ID_KEY]
            .iter()
            .find_map(|key| match self.0.get(*key)? {
                Value::String(s) if !s.is_empty() => Some(JobId::new(s.clone())),
                Value::Number(n) => Some(JobId::new(n.to_string())),
                _ => None,
            })
    }

    fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_truthy)
    }

    // Missing and null rc count as success; anything unparseable as failure.
    fn rc_is_nonzero(&self) -> bool {
        match self.0.get(RC_KEY) {
            None | Some(Value::Null) => false,
            Some(_) => self.rc() != Some(0),
        }
    }
}

impl From<Value> for HostResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_accepts_integer_flag() {
        assert!(HostResult::new(json!({"started": 1})).is_started());
        assert!(!HostResult::new(json!({"started": 0})).is_started());
        assert!(!HostResult::new(json!({"finished": 1})).is_started());
    }

    #[test]
    fn test_failure_from_flag_or_rc() {
        assert!(HostResult::new(json!({"failed": true})).is_failure());
        assert!(HostResult::new(json!({"rc": 2})).is_failure());
        assert!(HostResult::new(json!({"rc": "oops"})).is_failure());
        assert!(!HostResult::new(json!({"rc": 0})).is_failure());
        assert!(!HostResult::new(json!({"rc": "0"})).is_failure());
        assert!(!HostResult::new(json!({"changed": true})).is_failure());
    }

    #[test]
    fn test_job_id_string_or_number() {
        let by_string = HostResult::new(json!({"job_id": "42"}));
        let by_number = HostResult::new(json!({"job_id": 42}));

        assert_eq!(by_string.job_id(), Some(JobId::new("42")));
        assert_eq!(by_number.job_id(), Some(JobId::new("42")));
        assert_eq!(HostResult::new(json!({"job_id": ""})).job_id(), None);
    }

    #[test]
    fn test_job_id_ansible_alias() {
        let ansible = HostResult::new(json!({"started": 1, "ansible_job_id": "8841.17"}));
        let both = HostResult::new(json!({"job_id": "1", "ansible_job_id": "2"}));

        assert_eq!(ansible.job_id(), Some(JobId::new("8841.17")));
        assert_eq!(both.job_id(), Some(JobId::new("1")));
    }

    #[test]
    fn test_unreachable_is_failure() {
        let result = HostResult::unreachable("connection refused");

        assert!(result.is_failure());
        assert_eq!(result.as_value()["msg"], "connection refused");
    }
}
