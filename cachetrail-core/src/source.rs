//! Collaborator traits supplying interaction history and candidates.
//!
//! The engine reads everything it needs up front: the user's interactions
//! (a required primary source plus an optional secondary one), then the
//! candidate set or, for users without history, a popularity-ordered
//! fallback list. Scoring starts only once these reads have completed.

use std::error::Error as StdError;

use thiserror::Error;

use crate::candidate::CandidateItem;
use crate::interaction::InteractionRecord;

/// Default ceiling on the number of candidates scored per request.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;

/// Failure reported by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store could not be reached or refused the query.
    #[error("{operation} failed")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A stored row could not be turned into a domain value.
    #[error("{operation} returned an invalid row: {reason}")]
    InvalidRow {
        /// Description of the failed operation.
        operation: &'static str,
        /// What was wrong with the row.
        reason: String,
    },
}

impl SourceError {
    /// Wrap a backend error.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// Result of probing the optional secondary interaction source.
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryInteractions {
    /// The source responded with (possibly no) records.
    Available(Vec<InteractionRecord>),
    /// The source does not exist or could not be read for this request.
    Unavailable {
        /// Human-readable cause, used for logging.
        reason: String,
    },
}

/// Parameters for a candidate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateQuery {
    /// User the candidates are for.
    pub user_id: u64,
    /// Skip caches the user has already found.
    pub exclude_completed: bool,
    /// Skip caches the user owns.
    pub exclude_owned: bool,
    /// Maximum number of candidates to return.
    pub limit: usize,
}

impl CandidateQuery {
    /// Query for caches the user neither owns nor has found.
    ///
    /// # Examples
    /// ```
    /// use cachetrail_core::CandidateQuery;
    ///
    /// let query = CandidateQuery::for_user(7);
    /// assert!(query.exclude_completed && query.exclude_owned);
    /// assert_eq!(query.limit, 100);
    /// ```
    #[must_use]
    pub const fn for_user(user_id: u64) -> Self {
        Self {
            user_id,
            exclude_completed: true,
            exclude_owned: true,
            limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    /// Override the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Primary source of a user's interaction history.
///
/// Records are returned in arrival order and each carries a snapshot of the
/// referenced cache. Failures propagate to the caller.
pub trait InteractionSource {
    /// Return every interaction recorded for `user_id`.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the backing store cannot be read.
    fn interactions(&self, user_id: u64) -> Result<Vec<InteractionRecord>, SourceError>;
}

/// Optional, enriched source of interaction history.
///
/// Implementations report absence through
/// [`SecondaryInteractions::Unavailable`] instead of failing.
pub trait SecondaryInteractionSource {
    /// Fetch the interactions of `user_id`, or report the source unavailable.
    fn fetch_interactions(&self, user_id: u64) -> SecondaryInteractions;
}

/// Source of caches eligible for personalised ranking.
pub trait CandidateSource {
    /// Return up to `query.limit` eligible caches, newest first, each with an
    /// aggregate interaction count.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the backing store cannot be read.
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateItem>, SourceError>;
}

/// Source of non-personalised recommendations for users without history.
pub trait FallbackSource {
    /// Return up to `limit` eligible caches ordered by popularity.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the backing store cannot be read.
    fn popular(&self, user_id: u64, limit: usize) -> Result<Vec<CandidateItem>, SourceError>;
}

/// Secondary source for deployments without enriched interaction data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSecondarySource;

impl SecondaryInteractionSource for NoSecondarySource {
    fn fetch_interactions(&self, _user_id: u64) -> SecondaryInteractions {
        SecondaryInteractions::Unavailable {
            reason: "no secondary interaction source configured".to_owned(),
        }
    }
}

impl<T: InteractionSource + ?Sized> InteractionSource for &T {
    fn interactions(&self, user_id: u64) -> Result<Vec<InteractionRecord>, SourceError> {
        (**self).interactions(user_id)
    }
}

impl<T: SecondaryInteractionSource + ?Sized> SecondaryInteractionSource for &T {
    fn fetch_interactions(&self, user_id: u64) -> SecondaryInteractions {
        (**self).fetch_interactions(user_id)
    }
}

impl<T: CandidateSource + ?Sized> CandidateSource for &T {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateItem>, SourceError> {
        (**self).candidates(query)
    }
}

impl<T: FallbackSource + ?Sized> FallbackSource for &T {
    fn popular(&self, user_id: u64, limit: usize) -> Result<Vec<CandidateItem>, SourceError> {
        (**self).popular(user_id, limit)
    }
}
