//! DDL for the SQLite store.

/// Name of the optional interaction table.
pub const INTERACTION_TABLE: &str = "user_cache_interactions";

/// Tables every store requires: categories, caches, and find logs.
pub const CORE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    category_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS caches (
    cache_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    difficulty REAL NOT NULL DEFAULT 1,
    category_id INTEGER REFERENCES categories (category_id),
    owner_id INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS find_logs (
    log_id INTEGER PRIMARY KEY,
    cache_id INTEGER NOT NULL REFERENCES caches (cache_id),
    finder_id INTEGER NOT NULL,
    found_at INTEGER NOT NULL,
    UNIQUE (cache_id, finder_id)
);
CREATE INDEX IF NOT EXISTS idx_find_logs_finder ON find_logs (finder_id);
CREATE INDEX IF NOT EXISTS idx_caches_created ON caches (created_at);
";

/// The optional interaction table, unique per user, cache, and kind.
pub const INTERACTION_TABLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_cache_interactions (
    interaction_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    cache_id INTEGER NOT NULL REFERENCES caches (cache_id),
    interaction_type TEXT NOT NULL DEFAULT 'view',
    interaction_weight REAL,
    created_at INTEGER NOT NULL,
    UNIQUE (user_id, cache_id, interaction_type)
);
CREATE INDEX IF NOT EXISTS idx_interactions_user_type
    ON user_cache_interactions (user_id, interaction_type);
CREATE INDEX IF NOT EXISTS idx_interactions_cache ON user_cache_interactions (cache_id);
";
