//! `callog` CLI: conflict checks, recurrence expansion and project progress
//! over JSON files.
//!
//! ## Usage
//!
//! ```sh
//! # Check a candidate slot (stdin → stdout)
//! echo '{"candidate":{"date":"2025-06-10","startTime":"09:30","endTime":"10:30"},"existing":[]}' | callog check
//!
//! # Expand a create request into concrete instances with readable ids
//! callog expand -i request.json --id-prefix demo
//!
//! # Create against an existing calendar, honoring the batch conflict policy
//! callog create -i calendar.json --batch-policy defer-to-backend
//!
//! # Monthly progress for every project
//! callog stats -i projects.json --year 2025 --month 6
//! ```
//!
//! `--config <file>` (or `CALLOG_CONFIG`) loads defaults from TOML; flags win.

mod config;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use callog_engine::error::CallogError;
use callog_engine::ids::{IdSource, SequentialIds, UuidIds};
use callog_engine::project::{monthly_stats, Project};
use callog_engine::schedule::{ScheduleId, ScheduleInstance, TimeSlot};
use callog_engine::store::{InMemoryScheduleStore, ScheduleService};
use callog_engine::validation::validate_schedule;
use callog_engine::wire::{ConflictErrorResponse, ScheduleCreateRequest, ScheduleCreateResponse};
use callog_engine::{detect_conflict, expand_with_options, BatchConflictPolicy};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Exit status when a create is rejected for a time conflict.
const EXIT_CONFLICT: i32 = 2;

#[derive(Parser)]
#[command(
    name = "callog",
    version,
    about = "Callog schedule conflict checks and recurrence expansion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file
    #[arg(long, global = true, env = "CALLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a candidate slot against existing schedules
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Expand a schedule create request into concrete instances
    Expand {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        /// Instance cap for rules without an end count
        #[arg(long)]
        safety_cap: Option<u32>,
        /// Generate `<prefix>-N` ids instead of UUIDs
        #[arg(long)]
        id_prefix: Option<String>,
    },
    /// Create a schedule against an existing calendar
    Create {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        safety_cap: Option<u32>,
        /// check-each or defer-to-backend
        #[arg(long, value_parser = parse_policy)]
        batch_policy: Option<BatchConflictPolicy>,
        #[arg(long)]
        id_prefix: Option<String>,
    },
    /// Monthly progress for each project
    Stats {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInput {
    candidate: TimeSlot,
    #[serde(default)]
    existing: Vec<ScheduleInstance>,
    #[serde(default)]
    exclude_id: Option<ScheduleId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInput {
    #[serde(default)]
    existing: Vec<ScheduleInstance>,
    request: ScheduleCreateRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsInput {
    projects: Vec<Project>,
    #[serde(default)]
    schedules: Vec<ScheduleInstance>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Check { input, output } => {
            let raw = read_input(input.as_deref())?;
            let req: CheckInput =
                serde_json::from_str(&raw).context("Failed to parse check input")?;

            let result = detect_conflict(&req.candidate, &req.existing, req.exclude_id.as_ref());
            write_json(output.as_deref(), &result)?;
        }
        Commands::Expand {
            input,
            output,
            safety_cap,
            id_prefix,
        } => {
            let raw = read_input(input.as_deref())?;
            let req: ScheduleCreateRequest =
                serde_json::from_str(&raw).context("Failed to parse schedule request")?;
            if let Err(errors) = validate_schedule(&req.schedule) {
                bail!("Invalid schedule: {}", errors);
            }

            let mut options = config.expansion;
            if let Some(cap) = safety_cap {
                options.safety_cap = cap;
            }
            let rule = req.rule();
            let mut ids = id_source(id_prefix);
            let base = req.schedule.into_instance(ids.schedule_id());

            let instances = expand_with_options(&base, &rule, &options, &mut ids);
            let response = ScheduleCreateResponse::from_instances(&instances)
                .context("Expansion produced no schedules")?;
            write_json(output.as_deref(), &response)?;
        }
        Commands::Create {
            input,
            output,
            safety_cap,
            batch_policy,
            id_prefix,
        } => {
            let raw = read_input(input.as_deref())?;
            let req: CreateInput =
                serde_json::from_str(&raw).context("Failed to parse create input")?;

            let mut options = config.expansion;
            if let Some(cap) = safety_cap {
                options.safety_cap = cap;
            }
            let policy = batch_policy.unwrap_or(config.conflicts.batch_policy);
            let rule = req.request.rule();

            let store = InMemoryScheduleStore::with_schedules(req.existing);
            let mut service = ScheduleService::with_ids(store, id_source(id_prefix))
                .expansion_options(options)
                .batch_policy(policy);

            match service.create(req.request.schedule, &rule) {
                Ok(created) => {
                    let response = ScheduleCreateResponse::from_instances(&created)
                        .context("Create produced no schedules")?;
                    write_json(output.as_deref(), &response)?;
                }
                Err(CallogError::Conflict(err)) => {
                    write_json(output.as_deref(), &ConflictErrorResponse::from_error(&err))?;
                    process::exit(EXIT_CONFLICT);
                }
                Err(err) => return Err(err).context("Failed to create schedule"),
            }
        }
        Commands::Stats {
            input,
            output,
            year,
            month,
        } => {
            let raw = read_input(input.as_deref())?;
            let req: StatsInput =
                serde_json::from_str(&raw).context("Failed to parse stats input")?;

            let stats: Vec<_> = req
                .projects
                .iter()
                .map(|p| monthly_stats(p, &req.schedules, year, month))
                .collect();
            write_json(output.as_deref(), &stats)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays valid JSON. `RUST_LOG` applies unless
/// `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn id_source(prefix: Option<String>) -> Box<dyn IdSource> {
    match prefix {
        Some(prefix) => Box::new(SequentialIds::new(prefix)),
        None => Box::new(UuidIds),
    }
}

fn parse_policy(s: &str) -> std::result::Result<BatchConflictPolicy, String> {
    match s {
        "check-each" => Ok(BatchConflictPolicy::CheckEach),
        "defer-to-backend" => Ok(BatchConflictPolicy::DeferToBackend),
        other => Err(format!(
            "unknown batch policy '{}' (expected check-each or defer-to-backend)",
            other
        )),
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    content.push('\n');
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            let mut stdout = io::stdout();
            stdout
                .write_all(content.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
