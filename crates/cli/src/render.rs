//! Output rendering (table or JSON)

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use hostpoll_core::domain::{Aggregate, AggregateSummary, HostName, HostResult, PollDelta};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tabled::{Table, Tabled};

/// Output format of the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Tabled)]
pub struct HostRow {
    pub host: String,
    pub status: String,
    pub rc: String,
    pub detail: String,
}

/// JSON report of `hostpoll wait`
#[derive(Serialize)]
pub struct WaitReport<'a> {
    pub contacted: &'a BTreeMap<HostName, HostResult>,
    pub dark: &'a BTreeMap<HostName, HostResult>,
    pub unresolved: &'a BTreeSet<HostName>,
    pub summary: AggregateSummary,
}

fn row(host: &str, status: &str, result: Option<&HostResult>) -> HostRow {
    let rc = result
        .and_then(HostResult::rc)
        .map(|rc| rc.to_string())
        .unwrap_or_default();
    let detail = result
        .and_then(|r| r.as_value().get("msg"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    HostRow {
        host: host.to_string(),
        status: status.to_string(),
        rc,
        detail,
    }
}

fn contacted_status(result: &HostResult) -> &'static str {
    if result.is_skipped() {
        "skipped"
    } else if result.is_failure() {
        "failed"
    } else {
        "ok"
    }
}

/// Rows for a finished wait: terminal hosts first, unresolved last
pub fn wait_rows(aggregate: &Aggregate, unresolved: &BTreeSet<HostName>) -> Vec<HostRow> {
    let mut rows: Vec<HostRow> = aggregate
        .contacted
        .iter()
        .map(|(host, result)| row(host, contacted_status(result), Some(result)))
        .collect();
    rows.extend(
        aggregate
            .dark
            .iter()
            .map(|(host, result)| row(host, "dark", Some(result))),
    );
    rows.extend(unresolved.iter().map(|host| row(host, "unresolved", None)));
    rows
}

/// Rows for a single poll cycle
pub fn delta_rows(delta: &PollDelta) -> Vec<HostRow> {
    let mut rows: Vec<HostRow> = delta
        .contacted
        .iter()
        .map(|(host, result)| row(host, contacted_status(result), Some(result)))
        .collect();
    rows.extend(
        delta
            .dark
            .iter()
            .map(|(host, result)| row(host, "dark", Some(result))),
    );
    rows.extend(
        delta
            .polled
            .iter()
            .map(|(host, result)| row(host, "running", Some(result))),
    );
    rows
}

pub fn print_rows(rows: Vec<HostRow>) {
    if rows.is_empty() {
        println!("{}", "No hosts".yellow());
        return;
    }
    println!("{}", Table::new(rows));
}

pub fn print_summary(summary: &AggregateSummary, unresolved: usize) {
    let line = format!(
        "ok={} failed={} skipped={} dark={} unresolved={}",
        summary.ok, summary.failed, summary.skipped, summary.dark, unresolved
    );
    if summary.all_ok() && unresolved == 0 {
        println!("{} {}", "✓".green().bold(), line.green());
    } else {
        println!("{} {}", "✗".red().bold(), line.red());
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
