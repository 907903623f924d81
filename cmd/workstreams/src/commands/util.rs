//! Utility functions for CLI commands.

use bragdoc_workstream::{AchievementFilter, Phase, ProgressEvent, WorkstreamError};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;

use crate::Cli;
use crate::config::{Config, Input, load_config, load_file};

/// Gets the configuration for this invocation.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Loads the input file given with -f.
pub fn load_input(cli: &Cli) -> anyhow::Result<Input> {
    let path = cli
        .input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))?;
    load_file(path)
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(
    result: &T,
    output_path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        serde_yaml::to_string(result)?
    };

    match output_path {
        Some(path) => std::fs::write(path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Emits a progress event as one JSON line on stderr when --events is set.
pub fn emit(cli: &Cli, phase: Phase, message: impl Into<String>, count: Option<usize>) {
    let mut event = ProgressEvent::new(phase, message);
    if let Some(n) = count {
        event = event.with_count(n);
    }
    tracing::debug!(phase = %event.phase, count = ?event.count, "{}", event.message);
    if cli.events {
        match serde_json::to_string(&event) {
            Ok(line) => eprintln!("{line}"),
            Err(e) => tracing::warn!("encode progress event: {e}"),
        }
    }
}

/// Turns core errors into messages meant for people.
pub fn explain(err: WorkstreamError) -> anyhow::Error {
    match err {
        WorkstreamError::InsufficientData { count, minimum } => anyhow::anyhow!(
            "not enough achievements yet: {count} have embeddings, at least {minimum} are needed"
        ),
        WorkstreamError::NoExistingWorkstreams => {
            anyhow::anyhow!("no workstreams exist yet; run 'workstreams recluster' first")
        }
        other => other.into(),
    }
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Accepts RFC 3339 timestamps or plain dates (midnight UTC).
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid time '{s}', want RFC 3339 or YYYY-MM-DD"))
}

/// Population filter flags shared by commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only achievements starting at or after this time
    #[arg(long, value_parser = parse_time)]
    pub since: Option<DateTime<Utc>>,

    /// Only achievements starting before this time
    #[arg(long, value_parser = parse_time)]
    pub until: Option<DateTime<Utc>>,

    /// Only achievements in this project (repeatable)
    #[arg(long = "project")]
    pub projects: Vec<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> AchievementFilter {
        AchievementFilter {
            since: self.since,
            until: self.until,
            project_ids: (!self.projects.is_empty()).then(|| self.projects.clone()),
        }
    }
}
