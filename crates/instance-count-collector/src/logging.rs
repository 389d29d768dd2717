//! Tracing setup for the binary

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Crate targets raised to `debug` when debug mode is on
const DEBUG_TARGETS: &[&str] = &["instance_count_collector", "instance_count_common"];

/// Noisy SDK targets kept at `warn`
const QUIET_TARGETS: &[&str] = &["aws_config", "aws_sdk_ec2", "aws_sdk_cloudwatch", "aws_smithy_runtime"];

/// Build the env filter: `RUST_LOG` first, then `info`, quiet SDK targets,
/// and this crate at `debug` when `debug` is set.
pub fn env_filter(debug: bool) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    for target in QUIET_TARGETS {
        filter = filter.add_directive(
            format!("{target}=warn")
                .parse()
                .with_context(|| format!("Invalid log directive for {target}"))?,
        );
    }

    if debug {
        for target in DEBUG_TARGETS {
            filter = filter.add_directive(
                format!("{target}=debug")
                    .parse()
                    .with_context(|| format!("Invalid log directive for {target}"))?,
            );
        }
    }

    Ok(filter)
}

/// Install the global fmt subscriber
pub fn init_tracing(debug: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug)?)
        .init();
    Ok(())
}
