//! `init-db` command implementation.

use cachetrail_core::SqliteStore;
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, ENV_INIT_DB_DATABASE};

/// CLI arguments for the `init-db` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "init-db",
    long_about = "Create the category, cache, and find log tables together \
                 with the optional interaction table. Existing tables and \
                 rows are left untouched.",
    about = "Create the cache database schema"
)]
#[ortho_config(prefix = "CACHETRAIL")]
pub(crate) struct InitDbArgs {
    /// Path to the SQLite cache database; created when missing.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl InitDbArgs {
    fn into_config(self) -> Result<InitDbConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        InitDbConfig::try_from(merged)
    }
}

/// Resolved `init-db` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InitDbConfig {
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<InitDbArgs> for InitDbConfig {
    type Error = CliError;

    fn try_from(args: InitDbArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_INIT_DB_DATABASE,
        })?;
        Ok(Self { database })
    }
}

pub(crate) fn run_init_db(args: InitDbArgs) -> Result<InitDbConfig, CliError> {
    let config = args.into_config()?;
    initialise(&config)?;
    Ok(config)
}

fn initialise(config: &InitDbConfig) -> Result<(), CliError> {
    let path = &config.database;
    let store =
        SqliteStore::open(path.as_std_path()).map_err(|source| CliError::store(path, source))?;
    store
        .initialise_schema()
        .map_err(|source| CliError::store(path, source))?;
    store
        .initialise_interaction_table()
        .map_err(|source| CliError::store(path, source))
}
