//! Test-only, in-memory sources used by unit and behaviour tests.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::{
    CandidateItem, CandidateQuery, CandidateSource, FallbackSource, InteractionRecord,
    InteractionSource, SecondaryInteractionSource, SecondaryInteractions, SourceError,
};

/// In-memory store implementing every source trait.
///
/// Candidate queries perform a linear scan and are intended only for small
/// datasets. The secondary source is unavailable until
/// [`MemoryStore::with_secondary`] is called.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    interactions: HashMap<u64, Vec<InteractionRecord>>,
    secondary: Option<HashMap<u64, Vec<InteractionRecord>>>,
    items: Vec<CandidateItem>,
}

impl MemoryStore {
    /// Create a store holding `items` and no history.
    pub fn with_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = CandidateItem>,
    {
        Self {
            items: items.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Append primary interactions for `user_id`.
    #[must_use]
    pub fn with_interactions<I>(mut self, user_id: u64, records: I) -> Self
    where
        I: IntoIterator<Item = InteractionRecord>,
    {
        self.interactions.entry(user_id).or_default().extend(records);
        self
    }

    /// Append secondary interactions for `user_id`, making the secondary
    /// source available.
    #[must_use]
    pub fn with_secondary<I>(mut self, user_id: u64, records: I) -> Self
    where
        I: IntoIterator<Item = InteractionRecord>,
    {
        self.secondary
            .get_or_insert_with(HashMap::new)
            .entry(user_id)
            .or_default()
            .extend(records);
        self
    }

    fn completed_by(&self, user_id: u64) -> HashSet<u64> {
        let primary = self.interactions.get(&user_id).into_iter().flatten();
        let secondary = self
            .secondary
            .as_ref()
            .and_then(|map| map.get(&user_id))
            .into_iter()
            .flatten();
        primary
            .chain(secondary)
            .filter(|record| record.kind.is_found())
            .map(|record| record.item_id)
            .collect()
    }
}

impl InteractionSource for MemoryStore {
    fn interactions(&self, user_id: u64) -> Result<Vec<InteractionRecord>, SourceError> {
        Ok(self.interactions.get(&user_id).cloned().unwrap_or_default())
    }
}

impl SecondaryInteractionSource for MemoryStore {
    fn fetch_interactions(&self, user_id: u64) -> SecondaryInteractions {
        match &self.secondary {
            Some(map) => SecondaryInteractions::Available(
                map.get(&user_id).cloned().unwrap_or_default(),
            ),
            None => SecondaryInteractions::Unavailable {
                reason: "memory store has no secondary interactions".to_owned(),
            },
        }
    }
}

impl CandidateSource for MemoryStore {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateItem>, SourceError> {
        let completed = if query.exclude_completed {
            self.completed_by(query.user_id)
        } else {
            HashSet::new()
        };
        let mut items: Vec<CandidateItem> = self
            .items
            .iter()
            .filter(|item| !(query.exclude_owned && item.owner_id == Some(query.user_id)))
            .filter(|item| !completed.contains(&item.id))
            .cloned()
            .collect();
        items.sort_by_key(|item| (Reverse(item.created_at), Reverse(item.id)));
        items.truncate(query.limit);
        Ok(items)
    }
}

impl FallbackSource for MemoryStore {
    fn popular(&self, user_id: u64, limit: usize) -> Result<Vec<CandidateItem>, SourceError> {
        let mut items: Vec<CandidateItem> = self
            .items
            .iter()
            .filter(|item| item.owner_id != Some(user_id))
            .cloned()
            .collect();
        items.sort_by_key(|item| {
            (
                Reverse(item.interaction_count),
                Reverse(item.created_at),
                item.id,
            )
        });
        items.truncate(limit);
        Ok(items)
    }
}

/// Source whose reads always fail with a backend error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSource;

impl FailingSource {
    fn error(operation: &'static str) -> SourceError {
        SourceError::backend(operation, std::io::Error::other("store offline"))
    }
}

impl InteractionSource for FailingSource {
    fn interactions(&self, _user_id: u64) -> Result<Vec<InteractionRecord>, SourceError> {
        Err(Self::error("read interactions"))
    }
}

impl SecondaryInteractionSource for FailingSource {
    fn fetch_interactions(&self, _user_id: u64) -> SecondaryInteractions {
        SecondaryInteractions::Unavailable {
            reason: "store offline".to_owned(),
        }
    }
}

impl CandidateSource for FailingSource {
    fn candidates(&self, _query: &CandidateQuery) -> Result<Vec<CandidateItem>, SourceError> {
        Err(Self::error("read candidates"))
    }
}

impl FallbackSource for FailingSource {
    fn popular(&self, _user_id: u64, _limit: usize) -> Result<Vec<CandidateItem>, SourceError> {
        Err(Self::error("read popular caches"))
    }
}
