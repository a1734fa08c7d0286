use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::inventory::Inventory;

/// Cache key used while no account is bound.
pub const GUEST_KEY: &str = "guest";

const INVENTORY_DIR: &str = "inventory";
const POSITION_FILE: &str = "position.json";
const REVEALED_FILE: &str = "revealed.json";

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cache file {path} is corrupted: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Port the inventory store writes through to.
pub trait InventoryCache {
    fn load(&self, key: &str) -> Result<Option<Inventory>, CacheError>;
    fn store(&mut self, key: &str, inventory: &Inventory) -> Result<(), CacheError>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MemoryCache {
    entries: BTreeMap<String, Inventory>,
}

impl MemoryCache {
    pub fn get(&self, key: &str) -> Option<&Inventory> {
        self.entries.get(key)
    }
}

impl InventoryCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<Inventory>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, inventory: &Inventory) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), inventory.clone());
        Ok(())
    }
}

/// One JSON file per key under `<root>/inventory/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inventory_path(&self, key: &str) -> PathBuf {
        self.root
            .join(INVENTORY_DIR)
            .join(format!("{}.json", file_stem(key)))
    }
}

impl InventoryCache for FileCache {
    fn load(&self, key: &str) -> Result<Option<Inventory>, CacheError> {
        let path = self.inventory_path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path, source })
    }

    fn store(&mut self, key: &str, inventory: &Inventory) -> Result<(), CacheError> {
        let path = self.inventory_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(inventory).map_err(|source| {
            CacheError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, json).map_err(|source| CacheError::Io { path, source })
    }
}

/// Cache used by the running game: on disk, or in memory for offline and replay runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum SessionCache {
    Memory(MemoryCache),
    Files(FileCache),
}

impl Default for SessionCache {
    fn default() -> Self {
        SessionCache::Memory(MemoryCache::default())
    }
}

impl InventoryCache for SessionCache {
    fn load(&self, key: &str) -> Result<Option<Inventory>, CacheError> {
        match self {
            SessionCache::Memory(cache) => cache.load(key),
            SessionCache::Files(cache) => cache.load(key),
        }
    }

    fn store(&mut self, key: &str, inventory: &Inventory) -> Result<(), CacheError> {
        match self {
            SessionCache::Memory(cache) => cache.store(key, inventory),
            SessionCache::Files(cache) => cache.store(key, inventory),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pokewalk")
}

pub async fn save_position(root: &Path, position: Point) -> Result<(), CacheError> {
    write_json(&root.join(POSITION_FILE), &position).await
}

pub async fn load_position(root: &Path) -> Result<Option<Point>, CacheError> {
    read_json(&root.join(POSITION_FILE)).await
}

pub async fn save_revealed(root: &Path, keys: &[String]) -> Result<(), CacheError> {
    write_json(&root.join(REVEALED_FILE), &keys).await
}

pub async fn load_revealed(root: &Path) -> Result<Vec<String>, CacheError> {
    Ok(read_json(&root.join(REVEALED_FILE)).await?.unwrap_or_default())
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    let json = serde_json::to_string(value).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, CacheError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Species;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_cache_round_trips_per_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = FileCache::new(dir.path());
        let mut inventory = Inventory::new(3, 1);
        inventory.add_creature(&Species::new("onix", "o.png", &["rock", "ground"]));

        cache.store("ash", &inventory).expect("store");
        assert_eq!(cache.load("ash").expect("load"), Some(inventory));
        assert_eq!(cache.load(GUEST_KEY).expect("load"), None);
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path());
        let path = cache.inventory_path("ash");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "{not json").expect("write");

        let err = cache.load("ash").expect_err("corrupt");
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let cache = FileCache::new("/data");
        assert_eq!(
            cache.inventory_path("../evil id"),
            PathBuf::from("/data/inventory/___evil_id.json")
        );
    }

    #[tokio::test]
    async fn position_and_revealed_checkpoints() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_position(dir.path()).await.expect("load"), None);

        save_position(dir.path(), Point::new(12.5, 40.0))
            .await
            .expect("save");
        save_revealed(dir.path(), &["1,2".to_string(), "3,4".to_string()])
            .await
            .expect("save");

        assert_eq!(
            load_position(dir.path()).await.expect("load"),
            Some(Point::new(12.5, 40.0))
        );
        assert_eq!(
            load_revealed(dir.path()).await.expect("load"),
            vec!["1,2".to_string(), "3,4".to_string()]
        );
    }
}
