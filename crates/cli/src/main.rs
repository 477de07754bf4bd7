//! hostpoll CLI - Poll an asynchronous job across hosts until it finishes
//!
//! Reads the dispatch outcome (which hosts started the job under which job
//! id, which were unreachable) and polls the started hosts with a status
//! command.

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use hostpoll_core::application::poller::constants::{
    DEFAULT_ENV_ALLOWLIST, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_STATUS_CHECK_TIMEOUT_SECS,
};
use hostpoll_core::application::{cancel_channel, AsyncPoller};
use hostpoll_core::domain::DispatchOutcome;
use hostpoll_core::port::time_provider::SystemTimeProvider;
use hostpoll_infra_system::{CommandStatusChecker, TracingNotifier};
use logging::LogFormat;
use render::{OutputFormat, WaitReport};

/// Exit status when any host failed, went dark or is unresolved
const EXIT_HOSTS_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "hostpoll")]
#[command(about = "Poll an asynchronous job across many hosts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format
    #[arg(long, env = "HOSTPOLL_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long, env = "HOSTPOLL_LOG_FILE")]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single poll cycle and print what changed
    Poll {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Poll until the job finishes everywhere or the timeout expires
    Wait {
        #[command(flatten)]
        session: SessionArgs,

        /// Total seconds to wait
        #[arg(short, long, env = "HOSTPOLL_TIMEOUT_SECS")]
        timeout: u64,

        /// Seconds between status checks
        #[arg(short, long, env = "HOSTPOLL_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
        interval: u64,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Dispatch outcome JSON file (`-` for stdin)
    #[arg(short, long, env = "HOSTPOLL_DISPATCH")]
    dispatch: String,

    /// Status command run once per host
    #[arg(long, env = "HOSTPOLL_STATUS_CMD")]
    status_cmd: String,

    /// Status command argument; `{host}` and `{job_id}` are substituted
    #[arg(long = "status-arg", allow_hyphen_values = true)]
    status_args: Vec<String>,

    /// Per-host status check timeout in seconds
    #[arg(long, env = "HOSTPOLL_CHECK_TIMEOUT_SECS", default_value_t = DEFAULT_STATUS_CHECK_TIMEOUT_SECS)]
    check_timeout: u64,

    /// Environment variables passed to the status command
    #[arg(long, env = "HOSTPOLL_ENV_ALLOW", value_delimiter = ',', default_values_t = DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()))]
    env_allow: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,
}

impl SessionArgs {
    fn load_dispatch(&self) -> Result<DispatchOutcome> {
        let raw = if self.dispatch == "-" {
            std::io::read_to_string(std::io::stdin()).context("Failed to read dispatch from stdin")?
        } else {
            let path = PathBuf::from(shellexpand::tilde(&self.dispatch).into_owned());
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read dispatch file {}", path.display()))?
        };
        DispatchOutcome::from_json_str(&raw).context("Invalid dispatch outcome")
    }

    fn build_poller(&self) -> Result<AsyncPoller> {
        let dispatch = self.load_dispatch()?;
        let time_provider = Arc::new(SystemTimeProvider);

        let checker = CommandStatusChecker::new(
            self.status_cmd.clone(),
            self.status_args.clone(),
            time_provider.clone(),
        )
        .with_env_allowlist(self.env_allow.clone())
        .with_timeout(Duration::from_secs(self.check_timeout));

        AsyncPoller::new(
            dispatch,
            Arc::new(checker),
            Arc::new(TracingNotifier::new()),
            time_provider,
        )
        .context("Inconsistent dispatch outcome")
    }
}

async fn run_poll(session: SessionArgs) -> Result<ExitCode> {
    let mut poller = session.build_poller()?;
    let delta = poller.poll().await;

    match session.output {
        OutputFormat::Json => render::print_json(&delta)?,
        OutputFormat::Table => render::print_rows(render::delta_rows(&delta)),
    }

    let failed = delta.dark.len()
        + delta
            .contacted
            .values()
            .filter(|result| result.is_failure())
            .count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_HOSTS_FAILED)
    })
}

async fn run_wait(session: SessionArgs, timeout: u64, interval: u64) -> Result<ExitCode> {
    let mut poller = session.build_poller()?;

    let (cancel_tx, cancel_token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping wait");
            cancel_tx.cancel();
        }
    });

    let aggregate = poller
        .wait_with_cancel(timeout, interval, cancel_token)
        .await?;
    let unresolved = poller.pending();
    let summary = aggregate.summary();

    match session.output {
        OutputFormat::Json => render::print_json(&WaitReport {
            contacted: &aggregate.contacted,
            dark: &aggregate.dark,
            unresolved,
            summary,
        })?,
        OutputFormat::Table => {
            render::print_rows(render::wait_rows(&aggregate, unresolved));
            println!();
            render::print_summary(&summary, unresolved.len());
        }
    }

    Ok(if summary.all_ok() && unresolved.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_HOSTS_FAILED)
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()));
    let _log_guard = logging::init(cli.log_format, log_file.as_deref())?;

    info!("hostpoll v{} starting...", hostpoll_core::VERSION);

    match cli.command {
        Commands::Poll { session } => run_poll(session).await,
        Commands::Wait {
            session,
            timeout,
            interval,
        } => run_wait(session, timeout, interval).await,
    }
}
