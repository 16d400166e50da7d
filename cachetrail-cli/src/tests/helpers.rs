//! Helpers for building cache databases on disk.

use cachetrail_core::{CategoryId, NewCache, SqliteStore};
use camino::Utf8PathBuf;
use geo::Coord;
use tempfile::TempDir;

pub(super) const FINDER: u64 = 7;
pub(super) const NEWCOMER: u64 = 8;
pub(super) const OWNER: u64 = 100;

/// A seeded database in a temporary directory.
#[derive(Debug)]
pub(super) struct SeededDatabase {
    _dir: TempDir,
    pub(super) path: Utf8PathBuf,
}

impl SeededDatabase {
    /// Three nearby traditional caches, one distant puzzle, and two finds by
    /// [`FINDER`]. The puzzle has been found by another user, making it the
    /// most popular cache.
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let path = root.join("caches.db");
        let store = SqliteStore::open(path.as_std_path()).expect("open store");
        store.initialise_schema().expect("create schema");
        store
            .insert_category(CategoryId::new(1), "traditional")
            .expect("insert category");
        store
            .insert_category(CategoryId::new(2), "puzzle")
            .expect("insert category");
        let caches = [
            (1, 1, 2.0, Coord { x: -88.200, y: 40.100 }, 10),
            (2, 1, 2.0, Coord { x: -88.201, y: 40.101 }, 20),
            (3, 1, 2.5, Coord { x: -88.202, y: 40.100 }, 30),
            (4, 2, 5.0, Coord { x: 2.350, y: 48.850 }, 40),
            (5, 1, 2.0, Coord { x: -88.199, y: 40.099 }, 50),
        ];
        for (id, category, difficulty, location, created_at) in caches {
            store
                .insert_cache(&NewCache {
                    id,
                    title: format!("cache {id}"),
                    location,
                    difficulty,
                    category: Some(CategoryId::new(category)),
                    owner_id: OWNER,
                    active: true,
                    created_at,
                })
                .expect("insert cache");
        }
        store.record_find(FINDER, 1, 1_000).expect("record find");
        store.record_find(FINDER, 2, 1_001).expect("record find");
        store.record_find(99, 4, 1_002).expect("record find");
        store.record_find(98, 4, 1_003).expect("record find");
        Self { _dir: dir, path }
    }
}

/// Write a weights file into a fresh temporary directory.
pub(super) fn write_weights(contents: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
    let path = root.join("weights.json");
    std::fs::write(&path, contents).expect("write weights file");
    (dir, path)
}

/// Parse captured output as JSON.
pub(super) fn parse_output(buffer: &[u8]) -> serde_json::Value {
    let text = std::str::from_utf8(buffer).expect("stdout utf-8");
    serde_json::from_str(text).expect("output should be JSON")
}

/// Identifiers of the recommended caches in a JSON payload.
pub(super) fn recommended_ids(payload: &serde_json::Value) -> Vec<u64> {
    payload["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|scored| scored["item"]["id"].as_u64().expect("numeric id"))
        .collect()
}
