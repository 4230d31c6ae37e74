//! `MemStore` - Ephemeral In-Memory Backend
//!
//! Same live-map semantics as `FileStore` with no durable side: `save`,
//! `reload` and `close` are no-ops. For tests and examples.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::backend::{check_insert, StoreBackend};
use super::entity::{Entity, EntityKind};
use super::error::{StoreError, StoreResult};

/// In-memory storage backend with no persistence.
///
/// Clones share the same live map.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    objects: Arc<RwLock<HashMap<String, Entity>>>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemStore {
    async fn insert(&self, entity: &Entity) -> StoreResult<String> {
        assert!(!entity.id.is_empty(), "entity must have an id");

        let mut objects = self.objects.write().unwrap();
        check_insert(&objects, entity)?;
        objects.insert(entity.key(), entity.clone());

        Ok(entity.id.clone())
    }

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

    async fn save(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn reload(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
