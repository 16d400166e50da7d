//! Error types emitted by the Cachetrail CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use cachetrail_core::SqliteStoreError;
use cachetrail_scorer::{RecommendError, RecommenderConfigError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the Cachetrail CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An input file does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// An input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// An input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening or preparing the SQLite store failed.
    #[error("failed to use cache database {path:?}: {source}")]
    Store {
        path: Utf8PathBuf,
        #[source]
        source: Box<SqliteStoreError>,
    },
    /// Opening the weights file failed.
    #[error("failed to open weights file {path:?}: {source}")]
    OpenWeights {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The weights file is not valid JSON for a recommender configuration.
    #[error("failed to parse weights file {path:?}: {source}")]
    ParseWeights {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The configured weights were rejected.
    #[error("invalid ranking weights: {0}")]
    InvalidWeights(#[from] RecommenderConfigError),
    /// Building recommendations failed.
    #[error("failed to build recommendations: {0}")]
    Recommend(#[from] RecommendError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Installing the log subscriber failed.
    #[error("failed to initialise logging: {0}")]
    InitialiseLogging(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CliError {
    pub(crate) fn store(path: &camino::Utf8Path, source: SqliteStoreError) -> Self {
        Self::Store {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    }
}
