//! Command-line interface for Cachetrail recommendations.
//!
//! Every subcommand reads its options from CLI flags, `CACHETRAIL_CMDS_*`
//! environment variables, and configuration files, merged by `ortho_config`.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod error;
mod init_db;
mod recommend;

pub use error::CliError;

use init_db::{InitDbArgs, run_init_db};
use recommend::{ProfileArgs, RecommendArgs, run_profile, run_recommend};
#[cfg(test)]
use {
    init_db::InitDbConfig,
    recommend::{ProfileConfig, RecommendConfig, run_profile_with, run_recommend_with},
};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_USER: &str = "user";
pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ARG_WEIGHTS: &str = "weights";
pub(crate) const ENV_RECOMMEND_DATABASE: &str = "CACHETRAIL_CMDS_RECOMMEND_DATABASE";
pub(crate) const ENV_RECOMMEND_USER: &str = "CACHETRAIL_CMDS_RECOMMEND_USER";
pub(crate) const ENV_PROFILE_DATABASE: &str = "CACHETRAIL_CMDS_PROFILE_DATABASE";
pub(crate) const ENV_PROFILE_USER: &str = "CACHETRAIL_CMDS_PROFILE_USER";
pub(crate) const ENV_INIT_DB_DATABASE: &str = "CACHETRAIL_CMDS_INIT_DB_DATABASE";

const DEFAULT_LOG_FILTER: &str = "info";

/// Run the Cachetrail CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, the store, or
/// writing the output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging()?;
    match cli.command {
        Command::Recommend(args) => run_recommend(args),
        Command::Profile(args) => run_profile(args),
        Command::InitDb(args) => run_init_db(args).map(|config| {
            log::info!("initialised cache database at {}", config.database);
        }),
    }
}

fn init_logging() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(CliError::InitialiseLogging)
}

#[derive(Debug, Parser)]
#[command(
    name = "cachetrail",
    about = "Personalised cache recommendations from a Cachetrail database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recommend caches for a user.
    Recommend(RecommendArgs),
    /// Print the preference profile derived for a user.
    Profile(ProfileArgs),
    /// Create the database schema.
    InitDb(InitDbArgs),
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
