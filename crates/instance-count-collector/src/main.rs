//! instance-count: count EC2 instances in every region and publish the
//! counts to CloudWatch.
//!
//! `run` performs a single pass; `watch` repeats passes on an interval until
//! interrupted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use instance_count_collector::config::CollectorConfig;
use instance_count_collector::logging::init_tracing;
use instance_count_collector::orchestrator::AwsOrchestrator;
use instance_count_common::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_METRIC_NAME, DEFAULT_NAMESPACE, DEFAULT_WATCH_INTERVAL_SECS,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "instance-count")]
#[command(about = "Count EC2 instances across regions and publish the counts to CloudWatch")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand
#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Home region for region discovery and CloudWatch
    #[arg(long)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    profile: Option<String>,

    /// CloudWatch namespace
    #[arg(long, env = "METRIC_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Metric name for every count
    #[arg(long, env = "METRIC_NAME_INSTANCES", default_value = DEFAULT_METRIC_NAME)]
    metric_name: String,

    /// Log metric batches instead of publishing them
    #[arg(long, env = "DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    debug: bool,

    /// Number of regions processed concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    concurrency: usize,

    /// Only count instances in this state (repeatable, default: all states)
    #[arg(long = "state", value_name = "STATE")]
    states: Vec<String>,
}

impl From<CommonArgs> for CollectorConfig {
    fn from(args: CommonArgs) -> Self {
        Self {
            region: args.region,
            profile: args.profile,
            namespace: args.namespace,
            metric_name: args.metric_name,
            debug: args.debug,
            concurrency: args.concurrency,
            states: args.states,
        }
    }
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// As-of timestamp for every point (RFC 3339, default: now)
    #[arg(long, value_parser = parse_timestamp)]
    as_of: Option<DateTime<Utc>>,
}

#[derive(clap::Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Seconds between passes
    #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count instances once and publish the counts
    Run(RunArgs),

    /// Count instances on an interval until interrupted
    Watch(WatchArgs),
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{s}': {e}"))
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid concurrency '{s}': {e}")),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let debug = match &args.command {
        Command::Run(run_args) => run_args.common.debug,
        Command::Watch(watch_args) => watch_args.common.debug,
    };
    init_tracing(debug)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match args.command {
        Command::Run(run_args) => {
            let timestamp = run_args.as_of.unwrap_or_else(Utc::now);
            let config: CollectorConfig = run_args.common.into();
            log_config(&config);

            let orchestrator = AwsOrchestrator::from_config(&config).await;
            orchestrator
                .run(timestamp, &cancel)
                .await
                .context("Instance count pass failed")?;
        }

        Command::Watch(watch_args) => {
            let interval = Duration::from_secs(watch_args.interval_secs);
            let config: CollectorConfig = watch_args.common.into();
            log_config(&config);

            let orchestrator = AwsOrchestrator::from_config(&config).await;
            watch(&orchestrator, interval, &cancel).await;
        }
    }

    Ok(())
}

fn log_config(config: &CollectorConfig) {
    if let Some(profile) = &config.profile {
        info!(profile = %profile, "Using AWS profile");
    }
    info!(
        region = %config.region,
        namespace = %config.namespace,
        metric_name = %config.metric_name,
        debug = config.debug,
        concurrency = config.concurrency,
        states = ?config.states,
        "Loaded configuration"
    );
}

/// Run one pass per tick, each with a freshly sampled timestamp. Discovery
/// failures are logged and retried on the next tick.
async fn watch(orchestrator: &AwsOrchestrator, interval: Duration, cancel: &CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "Watching instance counts");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = orchestrator.run(Utc::now(), cancel).await {
                    error!(error = %e, "Pass failed, retrying on next tick");
                }
            }
        }
    }

    info!("Stopped watching");
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, finishing in-flight regions");
                cancel.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}
