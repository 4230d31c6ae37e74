//! Relationship Resolver
//!
//! Derived collections are computed by filtering the store, never stored as
//! back-pointers, so the storage engine stays the single source of truth.
//! A foreign key pointing at a deleted entity is silently skipped; with no
//! cascade on delete this is the mechanism that makes orphans harmless.
//!
//! Iteration order of a derived collection is unspecified.

use crate::store::{Entity, EntityKind, Place, StoreBackend, StoreResult};

/// Computes one-to-many and many-to-many views over a storage backend.
#[derive(Debug, Clone)]
pub struct Relations<S: StoreBackend> {
    store: S,
}

impl<S: StoreBackend> Relations<S> {
    /// Create a resolver over a backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn children<F>(&self, kind: EntityKind, matches: F) -> StoreResult<Vec<Entity>>
    where
        F: Fn(&Entity) -> bool,
    {
        Ok(self
            .store
            .all(kind)
            .await?
            .into_values()
            .filter(matches)
            .collect())
    }

    /// Cities whose `state_id` is `state_id`.
    pub async fn cities_of_state(&self, state_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::City, |entity| {
            entity.as_city().is_some_and(|city| city.state_id == state_id)
        })
        .await
    }

    /// Places whose `city_id` is `city_id`.
    pub async fn places_of_city(&self, city_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::Place, |entity| {
            entity.as_place().is_some_and(|place| place.city_id == city_id)
        })
        .await
    }

    /// Places owned by `user_id`.
    pub async fn places_of_user(&self, user_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::Place, |entity| {
            entity.as_place().is_some_and(|place| place.user_id == user_id)
        })
        .await
    }

    /// Reviews whose `place_id` is `place_id`.
    pub async fn reviews_of_place(&self, place_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::Review, |entity| {
            entity
                .as_review()
                .is_some_and(|review| review.place_id == place_id)
        })
        .await
    }

    /// Reviews written by `user_id`.
    pub async fn reviews_of_user(&self, user_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::Review, |entity| {
            entity
                .as_review()
                .is_some_and(|review| review.user_id == user_id)
        })
        .await
    }

    /// Live amenities referenced by a place's `amenity_ids`.
    ///
    /// Dangling ids are skipped.
    pub async fn amenities_of_place(&self, place: &Place) -> StoreResult<Vec<Entity>> {
        let amenities = self.store.all(EntityKind::Amenity).await?;
        Ok(place
            .amenity_ids
            .iter()
            .filter_map(|id| amenities.get(id).cloned())
            .collect())
    }

    /// Places whose `amenity_ids` contains `amenity_id` (reverse lookup).
    pub async fn places_with_amenity(&self, amenity_id: &str) -> StoreResult<Vec<Entity>> {
        self.children(EntityKind::Place, |entity| {
            entity
                .as_place()
                .is_some_and(|place| place.amenity_ids.iter().any(|id| id == amenity_id))
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================
