//! `recommend` and `profile` command implementations.

use std::fs::File;
use std::io::{BufReader, Write};

use cachetrail_core::SqliteStore;
use cachetrail_scorer::{DEFAULT_LIMIT, Recommender, RecommenderConfig};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_LIMIT, ARG_USER, ARG_WEIGHTS, CliError, ENV_PROFILE_DATABASE,
    ENV_PROFILE_USER, ENV_RECOMMEND_DATABASE, ENV_RECOMMEND_USER, write_json,
};

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "recommend",
    long_about = "Rank the caches a user has not yet found against the \
                 preference profile built from their history. Users without \
                 history receive the most popular caches instead. The result \
                 is printed as JSON.",
    about = "Recommend caches for a user"
)]
#[ortho_config(prefix = "CACHETRAIL")]
pub(crate) struct RecommendArgs {
    /// Path to the SQLite cache database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the user to recommend for.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<u64>,
    /// Maximum number of caches to return (default 10).
    #[arg(long = ARG_LIMIT, value_name = "n")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// JSON file overriding factor and interaction weights.
    #[arg(long = ARG_WEIGHTS, value_name = "path")]
    #[serde(default)]
    pub(crate) weights: Option<Utf8PathBuf>,
}

impl RecommendArgs {
    fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecommendConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) user: u64,
    pub(crate) limit: usize,
    pub(crate) weights: Option<Utf8PathBuf>,
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_RECOMMEND_DATABASE,
        })?;
        let user = args.user.ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_RECOMMEND_USER,
        })?;
        Ok(Self {
            database,
            user,
            limit: args.limit.unwrap_or(DEFAULT_LIMIT),
            weights: args.weights,
        })
    }
}

/// CLI arguments for the `profile` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "profile",
    long_about = "Build the preference profile of a user from their finds \
                 and recorded interactions and print it as JSON. Users \
                 without history print `null`.",
    about = "Print the preference profile of a user"
)]
#[ortho_config(prefix = "CACHETRAIL")]
pub(crate) struct ProfileArgs {
    /// Path to the SQLite cache database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Identifier of the user to profile.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<u64>,
    /// JSON file overriding interaction weights.
    #[arg(long = ARG_WEIGHTS, value_name = "path")]
    #[serde(default)]
    pub(crate) weights: Option<Utf8PathBuf>,
}

impl ProfileArgs {
    fn into_config(self) -> Result<ProfileConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ProfileConfig::try_from(merged)
    }
}

/// Resolved `profile` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProfileConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) user: u64,
    pub(crate) weights: Option<Utf8PathBuf>,
}

impl TryFrom<ProfileArgs> for ProfileConfig {
    type Error = CliError;

    fn try_from(args: ProfileArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_PROFILE_DATABASE,
        })?;
        let user = args.user.ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_PROFILE_USER,
        })?;
        Ok(Self {
            database,
            user,
            weights: args.weights,
        })
    }
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_recommend_with(args, &mut stdout)
}

pub(crate) fn run_recommend_with(
    args: RecommendArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let tunables = load_weights(config.weights.as_deref())?;
    let store = open_existing(&config.database)?;
    let recommender = Recommender::with_config(&store, &store, &store, &store, tunables)?;
    let recommendations = recommender.recommend(config.user, Some(config.limit))?;
    log::debug!(
        "returning {} {:?} recommendations for user {}",
        recommendations.items.len(),
        recommendations.strategy,
        config.user
    );
    write_json(writer, &recommendations)
}

pub(crate) fn run_profile(args: ProfileArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_profile_with(args, &mut stdout)
}

pub(crate) fn run_profile_with(args: ProfileArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let tunables = load_weights(config.weights.as_deref())?;
    let store = open_existing(&config.database)?;
    let recommender = Recommender::with_config(&store, &store, &store, &store, tunables)?;
    let profile = recommender.profile(config.user)?;
    write_json(writer, &profile)
}

/// Read recommender weights from a JSON file, or use the defaults.
///
/// Fields missing from the file keep their default values. The result is
/// validated when the recommender is built.
pub(crate) fn load_weights(path: Option<&Utf8Path>) -> Result<RecommenderConfig, CliError> {
    let Some(weights_path) = path else {
        return Ok(RecommenderConfig::default());
    };
    require_existing(weights_path, ARG_WEIGHTS)?;
    let file = File::open(weights_path).map_err(|source| CliError::OpenWeights {
        path: weights_path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseWeights {
        path: weights_path.to_path_buf(),
        source,
    })
}

/// Open an existing database read-only.
fn open_existing(path: &Utf8Path) -> Result<SqliteStore, CliError> {
    require_existing(path, ARG_DATABASE)?;
    SqliteStore::open_read_only(path.as_std_path()).map_err(|source| CliError::store(path, source))
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match path.metadata() {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}
