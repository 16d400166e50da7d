//! SQLite-backed store for caches, find logs, and interactions.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use geo::Coord;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use thiserror::Error;

use crate::candidate::CandidateItem;
use crate::interaction::{CategoryId, InteractionKind, InteractionRecord};
use crate::source::{
    CandidateQuery, CandidateSource, FallbackSource, InteractionSource, SecondaryInteractionSource,
    SecondaryInteractions, SourceError,
};

use super::schema::{CORE_SCHEMA, INTERACTION_TABLE, INTERACTION_TABLE_SCHEMA};

/// Weight stored with every find when read as an interaction.
const FIND_WEIGHT: f64 = 3.0;

const FIND_INTERACTIONS_SQL: &str = "SELECT
        f.cache_id, c.category_id, c.difficulty, c.latitude, c.longitude, f.found_at
     FROM find_logs AS f
     JOIN caches AS c ON c.cache_id = f.cache_id
     WHERE f.finder_id = ?1
     ORDER BY f.log_id";

const EXTRA_INTERACTIONS_SQL: &str = "SELECT
        i.cache_id, c.category_id, c.difficulty, c.latitude, c.longitude, i.created_at,
        i.interaction_type, i.interaction_weight
     FROM user_cache_interactions AS i
     JOIN caches AS c ON c.cache_id = i.cache_id
     WHERE i.user_id = ?1
     ORDER BY i.interaction_id";

const FIND_COUNT_SQL: &str =
    "(SELECT COUNT(*) FROM find_logs AS f2 WHERE f2.cache_id = c.cache_id)";

const INTERACTION_COUNT_SQL: &str =
    "(SELECT COUNT(*) FROM user_cache_interactions AS i2 WHERE i2.cache_id = c.cache_id)";

const CANDIDATE_COLUMNS: &str = "c.cache_id, c.title, c.latitude, c.longitude, c.difficulty,
        c.category_id, cat.name, c.owner_id, c.created_at";

/// Errors raised while reading or writing the SQLite store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing or executing a statement failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A previous holder of the connection panicked.
    #[error("SQLite connection lock was poisoned")]
    PoisonedConnection,
    /// The optional interaction table has not been created.
    #[error("table {INTERACTION_TABLE} does not exist")]
    MissingInteractionTable,
}

fn query_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> SqliteStoreError {
    move |source| SqliteStoreError::Query { operation, source }
}

/// A cache row to insert into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCache {
    /// Cache identifier.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// WGS84 position (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Difficulty rating.
    pub difficulty: f64,
    /// Category, if assigned.
    pub category: Option<CategoryId>,
    /// User who hid the cache.
    pub owner_id: u64,
    /// Whether the cache can still be found.
    pub active: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

/// Store backed by a single SQLite database.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{CategoryId, InteractionSource, NewCache, SqliteStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::open_in_memory()?;
/// store.initialise_schema()?;
/// store.insert_category(CategoryId::new(1), "traditional")?;
/// store.insert_cache(&NewCache {
///     id: 10,
///     title: "Old oak".into(),
///     location: Coord { x: -88.2, y: 40.1 },
///     difficulty: 2.0,
///     category: Some(CategoryId::new(1)),
///     owner_id: 99,
///     active: true,
///     created_at: 1_700_000_000,
/// })?;
/// assert!(store.record_find(7, 10, 1_700_000_100)?);
/// assert_eq!(store.interactions(7)?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    location: String,
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a read-write database at `path`.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::OpenDatabase`] when SQLite refuses the path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_connection(path.display().to_string(), connection))
    }

    /// Open an existing database without write access.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::OpenDatabase`] when the file is missing or
    /// unreadable.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_connection(path.display().to_string(), connection))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::OpenDatabase`] when SQLite cannot allocate
    /// the database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Ok(Self::from_connection(":memory:".to_owned(), connection))
    }

    const fn from_connection(location: String, connection: Connection) -> Self {
        Self {
            location,
            connection: Mutex::new(connection),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::PoisonedConnection)
    }

    /// Create the category, cache, and find log tables when missing.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the DDL fails.
    pub fn initialise_schema(&self) -> Result<(), SqliteStoreError> {
        self.lock()?
            .execute_batch(CORE_SCHEMA)
            .map_err(query_error("create core schema"))
    }

    /// Create the optional interaction table when missing.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the DDL fails.
    pub fn initialise_interaction_table(&self) -> Result<(), SqliteStoreError> {
        self.lock()?
            .execute_batch(INTERACTION_TABLE_SCHEMA)
            .map_err(query_error("create interaction table"))
    }

    /// Report whether the optional interaction table exists.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the catalogue cannot be read.
    pub fn has_interaction_table(&self) -> Result<bool, SqliteStoreError> {
        let connection = self.lock()?;
        interaction_table_exists(&connection)
    }

    /// Insert or rename a category.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the write fails.
    pub fn insert_category(&self, id: CategoryId, name: &str) -> Result<(), SqliteStoreError> {
        self.lock()?
            .execute(
                "INSERT INTO categories (category_id, name) VALUES (?1, ?2)
                 ON CONFLICT (category_id) DO UPDATE SET name = excluded.name",
                params![id.get(), name],
            )
            .map(|_| ())
            .map_err(query_error("insert category"))
    }

    /// Insert a cache.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the write fails, for example
    /// on a duplicate identifier.
    pub fn insert_cache(&self, cache: &NewCache) -> Result<(), SqliteStoreError> {
        self.lock()?
            .execute(
                "INSERT INTO caches (
                    cache_id, title, latitude, longitude, difficulty,
                    category_id, owner_id, is_active, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    cache.id,
                    cache.title,
                    cache.location.y,
                    cache.location.x,
                    cache.difficulty,
                    cache.category.map(CategoryId::get),
                    cache.owner_id,
                    cache.active,
                    cache.created_at,
                ],
            )
            .map(|_| ())
            .map_err(query_error("insert cache"))
    }

    /// Log that `user_id` found `cache_id`.
    ///
    /// Returns `false` when the user had already found the cache; the
    /// original find is kept.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the write fails.
    pub fn record_find(
        &self,
        user_id: u64,
        cache_id: u64,
        found_at: i64,
    ) -> Result<bool, SqliteStoreError> {
        let inserted = self
            .lock()?
            .execute(
                "INSERT OR IGNORE INTO find_logs (cache_id, finder_id, found_at)
                 VALUES (?1, ?2, ?3)",
                params![cache_id, user_id, found_at],
            )
            .map_err(query_error("record find"))?;
        Ok(inserted > 0)
    }

    /// Record a non-find interaction, refreshing the timestamp and weight of
    /// an existing row for the same user, cache, and kind.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::MissingInteractionTable`] when the optional
    /// table has not been created, or [`SqliteStoreError::Query`] when the
    /// write fails.
    pub fn record_interaction(
        &self,
        user_id: u64,
        cache_id: u64,
        kind: InteractionKind,
        weight: Option<f64>,
        occurred_at: i64,
    ) -> Result<(), SqliteStoreError> {
        let connection = self.lock()?;
        if !interaction_table_exists(&connection)? {
            return Err(SqliteStoreError::MissingInteractionTable);
        }
        connection
            .execute(
                "INSERT INTO user_cache_interactions
                    (user_id, cache_id, interaction_type, interaction_weight, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (user_id, cache_id, interaction_type) DO UPDATE SET
                    interaction_weight = excluded.interaction_weight,
                    created_at = excluded.created_at",
                params![user_id, cache_id, kind.as_str(), weight, occurred_at],
            )
            .map(|_| ())
            .map_err(query_error("record interaction"))
    }

    /// Read every find of `user_id` as a `found` interaction.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the query fails.
    pub fn find_interactions(
        &self,
        user_id: u64,
    ) -> Result<Vec<InteractionRecord>, SqliteStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(FIND_INTERACTIONS_SQL)
            .map_err(query_error("prepare find log query"))?;
        let rows = statement
            .query_map([user_id], |row| {
                let record = snapshot_from_row(row, InteractionKind::Found)?;
                Ok(record.with_weight(FIND_WEIGHT))
            })
            .map_err(query_error("query find logs"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(query_error("read find log row"))
    }

    /// Read the optional interactions of `user_id`.
    ///
    /// Returns `None` when the interaction table does not exist.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the query fails.
    pub fn extra_interactions(
        &self,
        user_id: u64,
    ) -> Result<Option<Vec<InteractionRecord>>, SqliteStoreError> {
        let connection = self.lock()?;
        if !interaction_table_exists(&connection)? {
            return Ok(None);
        }
        let mut statement = connection
            .prepare(EXTRA_INTERACTIONS_SQL)
            .map_err(query_error("prepare interaction query"))?;
        let rows = statement
            .query_map([user_id], |row| {
                let label: String = row.get(6)?;
                let weight: Option<f64> = row.get(7)?;
                // Unknown labels fall through to `Other`.
                let kind = label.parse().unwrap_or(InteractionKind::Other);
                let mut record = snapshot_from_row(row, kind)?;
                record.weight_override = weight;
                Ok(record)
            })
            .map_err(query_error("query interactions"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(query_error("read interaction row"))
    }

    /// Read caches eligible for personalised ranking, newest first.
    ///
    /// Interaction counts add optional interactions to finds when the
    /// interaction table exists.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the query fails.
    pub fn candidate_items(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateItem>, SqliteStoreError> {
        let connection = self.lock()?;
        let count = if interaction_table_exists(&connection)? {
            format!("{FIND_COUNT_SQL} + {INTERACTION_COUNT_SQL}")
        } else {
            FIND_COUNT_SQL.to_owned()
        };
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS}, {count} AS total_interactions
             FROM caches AS c
             JOIN categories AS cat ON cat.category_id = c.category_id
             WHERE c.is_active = 1
               AND (?2 = 0 OR c.owner_id != ?1)
               AND (?3 = 0 OR c.cache_id NOT IN (
                    SELECT cache_id FROM find_logs WHERE finder_id = ?1
               ))
             ORDER BY c.created_at DESC, c.cache_id DESC
             LIMIT ?4"
        );
        let mut statement = connection
            .prepare(&sql)
            .map_err(query_error("prepare candidate query"))?;
        let rows = statement
            .query_map(
                params![
                    query.user_id,
                    query.exclude_owned,
                    query.exclude_completed,
                    sql_limit(query.limit),
                ],
                candidate_from_row,
            )
            .map_err(query_error("query candidates"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(query_error("read candidate row"))
    }

    /// Read active caches not owned by `user_id`, most found first.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Query`] when the query fails.
    pub fn popular_items(
        &self,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, SqliteStoreError> {
        let connection = self.lock()?;
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS}, {FIND_COUNT_SQL} AS total_interactions
             FROM caches AS c
             JOIN categories AS cat ON cat.category_id = c.category_id
             WHERE c.is_active = 1 AND c.owner_id != ?1
             ORDER BY total_interactions DESC, c.created_at DESC, c.cache_id
             LIMIT ?2"
        );
        let mut statement = connection
            .prepare(&sql)
            .map_err(query_error("prepare popularity query"))?;
        let rows = statement
            .query_map(params![user_id, sql_limit(limit)], candidate_from_row)
            .map_err(query_error("query popular caches"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(query_error("read popular cache row"))
    }
}

fn interaction_table_exists(connection: &Connection) -> Result<bool, SqliteStoreError> {
    connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [INTERACTION_TABLE],
            |_| Ok(()),
        )
        .optional()
        .map(|row| row.is_some())
        .map_err(query_error("inspect schema"))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Read the leading cache snapshot columns shared by both interaction
/// queries: id, category, difficulty, latitude, longitude, timestamp.
fn snapshot_from_row(row: &Row<'_>, kind: InteractionKind) -> rusqlite::Result<InteractionRecord> {
    let item_id: u64 = row.get(0)?;
    let category: Option<u64> = row.get(1)?;
    let difficulty: Option<f64> = row.get(2)?;
    let latitude: Option<f64> = row.get(3)?;
    let longitude: Option<f64> = row.get(4)?;
    let occurred_at: i64 = row.get(5)?;
    Ok(InteractionRecord {
        item_id,
        category: category.map(CategoryId::new),
        difficulty,
        location: latitude.zip(longitude).map(|(y, x)| Coord { x, y }),
        kind,
        weight_override: None,
        occurred_at,
    })
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<CandidateItem> {
    let total: i64 = row.get(9)?;
    Ok(CandidateItem {
        id: row.get(0)?,
        title: row.get(1)?,
        location: Coord {
            x: row.get(3)?,
            y: row.get(2)?,
        },
        difficulty: row.get(4)?,
        category: CategoryId::new(row.get(5)?),
        category_name: row.get(6)?,
        owner_id: row.get(7)?,
        created_at: row.get(8)?,
        interaction_count: u64::try_from(total).unwrap_or(0),
    })
}

impl InteractionSource for SqliteStore {
    fn interactions(&self, user_id: u64) -> Result<Vec<InteractionRecord>, SourceError> {
        self.find_interactions(user_id)
            .map_err(|err| SourceError::backend("read find logs", err))
    }
}

impl SecondaryInteractionSource for SqliteStore {
    fn fetch_interactions(&self, user_id: u64) -> SecondaryInteractions {
        match self.extra_interactions(user_id) {
            Ok(Some(records)) => SecondaryInteractions::Available(records),
            Ok(None) => SecondaryInteractions::Unavailable {
                reason: SqliteStoreError::MissingInteractionTable.to_string(),
            },
            Err(err) => SecondaryInteractions::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

impl CandidateSource for SqliteStore {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateItem>, SourceError> {
        self.candidate_items(query)
            .map_err(|err| SourceError::backend("read candidates", err))
    }
}

impl FallbackSource for SqliteStore {
    fn popular(&self, user_id: u64, limit: usize) -> Result<Vec<CandidateItem>, SourceError> {
        self.popular_items(user_id, limit)
            .map_err(|err| SourceError::backend("read popular caches", err))
    }
}
