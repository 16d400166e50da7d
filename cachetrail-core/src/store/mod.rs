//! Persistence-backed implementations of the collaborator traits.
//!
//! The SQLite store keeps caches, categories, find logs, and an optional
//! table of richer interactions. It implements every trait in
//! [`crate::source`] so a single store can back a recommender.

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::{CORE_SCHEMA, INTERACTION_TABLE, INTERACTION_TABLE_SCHEMA};
#[cfg(feature = "store-sqlite")]
pub use sqlite::{NewCache, SqliteStore, SqliteStoreError};
