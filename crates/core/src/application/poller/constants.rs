// Poller constants (No magic values)

/// Default interval between status checks (10s)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default per-host timeout for one status check (30s)
/// Used by command-based status checkers
pub const DEFAULT_STATUS_CHECK_TIMEOUT_SECS: u64 = 30;

/// Environment variables passed to status-check commands by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER"];

/// Exit code meaning "host unreachable" (ssh convention)
pub const UNREACHABLE_EXIT_CODE: i32 = 255;
