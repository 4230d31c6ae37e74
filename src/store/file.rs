//! `FileStore` - Durable JSON-Document Backend
//!
//! `TigerStyle`: One writer discipline, atomic swap, tolerant reload.
//!
//! The whole object graph lives in one JSON document mapping composite
//! `<Kind>.<id>` keys to flat attribute mappings. Every save rewrites the
//! full document: entities are serialized in `BTreeMap` order so an
//! unchanged store always produces byte-identical output, written to a
//! sibling temp file and renamed into place so readers of the path never
//! observe a torn document.
//!
//! Suited to small catalogs; a store that outgrows full-document rewrites
//! wants a per-record or append-only layout instead.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use super::backend::{check_insert, StoreBackend};
use super::entity::{Entity, EntityKind};
use super::error::{StoreError, StoreResult};

/// Durable storage backend over a single JSON document.
///
/// Thread-safe and cheap to clone: clones share the live map and the flush
/// lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Path of the durable document
    path: PathBuf,
    /// Live entities keyed by composite `<Kind>.<id>` key
    objects: Arc<RwLock<HashMap<String, Entity>>>,
    /// Serializes flushes so writers cannot interleave on the temp file
    flush_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open a store backed by `path`, loading any existing document.
    ///
    /// A missing or corrupt document yields an empty store; a document that
    /// exists but cannot be read fails with `ReadFailed`.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            flush_lock: Arc::new(Mutex::new(())),
        };
        store.reload().await?;
        Ok(store)
    }

    /// Path of the durable document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StoreBackend for FileStore {
    #[tracing::instrument(skip(self, entity), fields(key = %entity.key()))]
    async fn insert(&self, entity: &Entity) -> StoreResult<String> {
        // Precondition
        assert!(!entity.id.is_empty(), "entity must have an id");

        let mut objects = self.objects.write().unwrap();
        check_insert(&objects, entity)?;
        objects.insert(entity.key(), entity.clone());

        Ok(entity.id.clone())
    }

    #[tracing::instrument(skip(self, entity), fields(key = %entity.key()))]
    async fn update(&self, entity: &Entity) -> StoreResult<()> {
        let mut objects = self.objects.write().unwrap();
        let key = entity.key();
        if !objects.contains_key(&key) {
            return Err(StoreError::not_found(key));
        }
        objects.insert(key, entity.clone());

        Ok(())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Entity>> {
        let objects = self.objects.read().unwrap();
        Ok(objects.get(&kind.key(id)).cloned())
    }

    async fn all(&self, kind: EntityKind) -> StoreResult<HashMap<String, Entity>> {
        let objects = self.objects.read().unwrap();
        Ok(objects
            .values()
            .filter(|entity| entity.kind() == kind)
            .map(|entity| (entity.id.clone(), entity.clone()))
            .collect())
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        let objects = self.objects.read().unwrap();
        Ok(objects.values().filter(|entity| entity.kind() == kind).count())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        let mut objects = self.objects.write().unwrap();
        Ok(objects.remove(&kind.key(id)).is_some())
    }

    #[tracing::instrument(skip(self))]
    async fn save(&self) -> StoreResult<()> {
        let _flush = self.flush_lock.lock().unwrap();

        let document: BTreeMap<String, Entity> = {
            let objects = self.objects.read().unwrap();
            objects
                .iter()
                .map(|(key, entity)| (key.clone(), entity.clone()))
                .collect()
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(|err| StoreError::serialization(err.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|err| StoreError::write_failed(err.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::write_failed(err.to_string()))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn reload(&self) -> StoreResult<()> {
        let loaded = match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, Entity>>(&text) {
                Ok(objects) => objects,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        path = %self.path.display(),
                        "store document is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            // Starting empty over a document that exists but cannot be read
            // would let the next flush overwrite it.
            Err(err) => return Err(StoreError::read_failed(err.to_string())),
        };

        *self.objects.write().unwrap() = loaded;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.save().await
    }
}

// =============================================================================
// Tests
// =============================================================================
