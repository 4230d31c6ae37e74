//! Storage Backend Trait
//!
//! Abstract interface over the authoritative entity collection. All
//! implementations key entities by the composite `<Kind>.<id>` string, which
//! is also the layout of the persisted document, so reload needs no separate
//! index rebuild.

use std::collections::HashMap;

use async_trait::async_trait;

use super::entity::{Entity, EntityKind};
use super::error::{StoreError, StoreResult};

/// Abstract storage backend for catalog entities.
///
/// `TigerStyle`: All operations are async, return explicit errors.
///
/// Absence is a value, not an error: `get` returns `Ok(None)` and `delete`
/// returns `Ok(false)` for keys that are not live.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Register a newly constructed entity under its composite key.
    ///
    /// Fails with `AlreadyExists` if the key is taken and with
    /// `MissingReference` if a foreign-key field does not resolve to a live
    /// entity. Returns the entity id.
    async fn insert(&self, entity: &Entity) -> StoreResult<String>;

    /// Write a mutated entity back under its existing key.
    ///
    /// Fails with `NotFound` if the key is not live. Foreign keys are not
    /// re-checked: they cannot change after creation, and entities orphaned
    /// by a parent delete must remain updatable.
    async fn update(&self, entity: &Entity) -> StoreResult<()>;

    /// Get an entity by kind and id.
    async fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Entity>>;

    /// Get every live entity of a kind, keyed by id. Order is unspecified.
    async fn all(&self, kind: EntityKind) -> StoreResult<HashMap<String, Entity>>;

    /// Count live entities of a kind.
    async fn count(&self, kind: EntityKind) -> StoreResult<usize>;

    /// Remove an entity. Dependents are not cascaded.
    ///
    /// Returns true if the entity existed and was removed.
    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<bool>;

    /// Durably persist the full object graph.
    ///
    /// Idempotent: with no intervening mutation, repeated saves produce
    /// byte-identical durable state. A concurrent reader never observes a
    /// partially written document.
    async fn save(&self) -> StoreResult<()>;

    /// Repopulate the live set from durable storage.
    ///
    /// Missing or corrupt storage yields an empty store, not an error;
    /// storage that exists but cannot be read fails with `ReadFailed`.
    async fn reload(&self) -> StoreResult<()>;

    /// Flush and release any held resources at end of scope.
    async fn close(&self) -> StoreResult<()>;
}

/// Insert-time checks shared by all backends: composite-key uniqueness and
/// foreign-key existence.
pub(crate) fn check_insert(
    objects: &HashMap<String, Entity>,
    entity: &Entity,
) -> StoreResult<()> {
    let key = entity.key();
    if objects.contains_key(&key) {
        return Err(StoreError::already_exists(key));
    }
    for (kind, id) in entity.references() {
        if !objects.contains_key(&kind.key(id)) {
            return Err(StoreError::missing_reference(kind, id));
        }
    }
    Ok(())
}
