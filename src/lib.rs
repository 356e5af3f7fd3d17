//! Lifecycle handles for clusters and infra-envs in installer service test
//! suites.
//!
//! A test builds an [`entity::Cluster`] or [`entity::InfraEnv`] from an
//! [`client::InventoryClient`], a configuration record and a
//! [`nodes::NodeManager`]. Construction creates or adopts the remote
//! resource; the test may then override configuration fields and call
//! [`entity::Entity::prepare_for_installation`].

pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod id;
pub mod nodes;
pub mod wait;

pub use error::HarnessError;
pub use id::EntityId;

use std::io::Write;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::config::{ConfigOverrides, EntityProfile};
use crate::entity::PreparationPlan;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Loads a profile and applies the command-line overrides to it.
fn load_with_overrides(opts: &cli::ProfileArgs) -> Result<EntityProfile> {
    let mut profile = config::load_profile(&opts.file)
        .with_context(|| format!("failed to load profile from {}", opts.file))?;
    let overrides = ConfigOverrides::parse_assignments(&opts.overrides)?;
    if !overrides.is_empty() {
        info!("Updating {} configurations to {}", profile.kind(), overrides);
        profile
            .apply_overrides(&overrides)
            .context("failed to apply overrides")?;
    }
    Ok(profile)
}

pub fn run_validate(opts: &cli::ProfileArgs, out: &mut dyn Write) -> Result<()> {
    let profile = load_with_overrides(opts)?;
    info!("validation successful: {} profile {}", profile.kind(), opts.file);
    write!(out, "{}", profile.to_yaml()?).context("failed to write profile")?;
    Ok(())
}

pub fn run_plan(opts: &cli::ProfileArgs, out: &mut dyn Write) -> Result<()> {
    let profile = load_with_overrides(opts)?;
    let plan = PreparationPlan::for_config(profile.base());
    writeln!(out, "prepare_for_installation ({}):", profile.kind())
        .and_then(|()| write!(out, "{}", plan))
        .context("failed to write plan")?;
    Ok(())
}

pub fn run_completions(opts: &cli::CompletionsArgs, out: &mut dyn Write) {
    let mut cmd = cli::Cli::command();
    clap_complete::generate(opts.shell, &mut cmd, env!("CARGO_PKG_NAME"), out);
}
