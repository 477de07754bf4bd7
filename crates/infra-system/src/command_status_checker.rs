// Command status checker implementation
// reason: async-trait, tokio for async process management, futures for per-host fan-out
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use hostpoll_core::application::poller::constants::{
    DEFAULT_ENV_ALLOWLIST, DEFAULT_STATUS_CHECK_TIMEOUT_SECS, UNREACHABLE_EXIT_CODE,
};
use hostpoll_core::domain::{HostName, HostResult, JobId, StatusReport};
use hostpoll_core::port::{StatusCheckError, StatusChecker, TimeProvider};

/// Placeholder replaced by the target host name
pub const HOST_PLACEHOLDER: &str = "{host}";
/// Placeholder replaced by the job id
pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// Outcome of checking a single host
#[derive(Debug)]
enum HostOutcome {
    Contacted(HostResult),
    Dark(HostResult),
}

/// Command status checker
/// Runs one command per host, concurrently, with environment allowlisting
///
/// The command is expected to print the job status as a JSON object. Exit code
/// 255 (ssh convention), spawn failures and timeouts mark the host dark.
pub struct CommandStatusChecker {
    program: String,
    args: Vec<String>,
    env_allowlist: Vec<String>,
    per_host_timeout: Duration,
    time_provider: Arc<dyn TimeProvider>,
}

impl CommandStatusChecker {
    /// Create a new command status checker
    ///
    /// # Arguments
    /// * `program` - Executable to run once per host
    /// * `args` - Arguments; `{host}` and `{job_id}` are substituted
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let checker = CommandStatusChecker::new(
    ///     "ssh",
    ///     vec!["{host}".into(), "job-status".into(), "{job_id}".into()],
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            per_host_timeout: Duration::from_secs(DEFAULT_STATUS_CHECK_TIMEOUT_SECS),
            time_provider,
        }
    }

    /// Replace the allowed environment variables
    pub fn with_env_allowlist(mut self, env_allowlist: Vec<String>) -> Self {
        self.env_allowlist = env_allowlist;
        self
    }

    /// Replace the per-host timeout
    pub fn with_timeout(mut self, per_host_timeout: Duration) -> Self {
        self.per_host_timeout = per_host_timeout;
        self
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        env.into_iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    /// Substitute placeholders in the configured arguments
    fn render_args(&self, host: &str, job_id: &JobId) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(HOST_PLACEHOLDER, host)
                    .replace(JOB_ID_PLACEHOLDER, job_id.as_str())
            })
            .collect()
    }

    /// Spawn child process and wait for output (killed on timeout)
    async fn spawn_and_wait(&self, args: &[String]) -> Result<Output, String> {
        let child = Command::new(&self.program)
            .args(args)
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {}", self.program, e))?;

        match timeout(self.per_host_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(format!("failed to collect output: {}", e)),
            Err(_) => Err(format!(
                "status check timed out after {}s",
                self.per_host_timeout.as_secs()
            )),
        }
    }

    /// Check a single host
    async fn check_host(&self, host: &str, job_id: &JobId) -> HostOutcome {
        let args = self.render_args(host, job_id);
        let start_time = self.time_provider.now_millis();

        let outcome = match self.spawn_and_wait(&args).await {
            Ok(output) => classify_output(&output),
            Err(msg) => HostOutcome::Dark(HostResult::unreachable(msg)),
        };

        debug!(
            host = %host,
            job_id = %job_id,
            duration_ms = self.time_provider.now_millis() - start_time,
            outcome = ?outcome,
            "Host status checked"
        );

        outcome
    }
}

/// Build the host outcome from process output
fn classify_output(output: &Output) -> HostOutcome {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let Some(code) = output.status.code() else {
        return HostOutcome::Dark(HostResult::unreachable("status command terminated by signal"));
    };

    if code == UNREACHABLE_EXIT_CODE {
        let msg = match stderr.trim() {
            "" => "host unreachable".to_string(),
            reason => reason.to_string(),
        };
        return HostOutcome::Dark(HostResult::unreachable(msg));
    }

    match parse_object(&stdout) {
        Some(mut object) => {
            // A failing exit status overrides output that claims success
            if code != 0 {
                let reported_rc_failed = HostResult::new(json!({ "rc": object.get("rc") }))
                    .rc()
                    .is_some_and(|rc| rc != 0);
                if !reported_rc_failed {
                    object.insert("rc".to_string(), json!(code));
                }
                object.insert("failed".to_string(), json!(true));
            }
            HostOutcome::Contacted(HostResult::new(Value::Object(object)))
        }
        None => {
            let msg = if code == 0 {
                "status output is not a JSON object".to_string()
            } else {
                format!("status command exited with code {}", code)
            };
            HostOutcome::Contacted(HostResult::new(json!({
                "failed": true,
                "rc": code,
                "msg": msg,
                "stdout": stdout,
                "stderr": stderr,
            })))
        }
    }
}

fn parse_object(stdout: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(stdout.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

#[async_trait]
impl StatusChecker for CommandStatusChecker {
    async fn check_status(
        &self,
        job_id: &JobId,
        hosts: &[HostName],
    ) -> Result<StatusReport, StatusCheckError> {
        if self.program.trim().is_empty() {
            return Err(StatusCheckError::InvalidCommand(
                "status command is empty".to_string(),
            ));
        }

        info!(
            program = %self.program,
            job_id = %job_id,
            hosts = hosts.len(),
            "Checking async job status"
        );

        let outcomes = join_all(hosts.iter().map(|host| self.check_host(host, job_id))).await;

        let mut report = StatusReport::new();
        for (host, outcome) in hosts.iter().zip(outcomes) {
            match outcome {
                HostOutcome::Contacted(result) => {
                    report.contacted.insert(host.clone(), result);
                }
                HostOutcome::Dark(result) => {
                    report.dark.insert(host.clone(), result);
                }
            }
        }

        Ok(report)
    }
}
