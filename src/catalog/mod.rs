//! Catalog - Service Facade
//!
//! `TigerStyle`: Validate up front, commit with rollback, explicit errors.
//!
//! # Overview
//!
//! The Catalog orchestrates the storage engine and the relationship
//! resolver behind the exact operation contract a REST route layer
//! consumes: per-kind CRUD, creation nested under a parent, amenity
//! linking and aggregate stats. Request bodies arrive as JSON values; the
//! catalog owns the shared validation protocol:
//!
//! 1. the body must be a JSON object (`NotJson` otherwise),
//! 2. required fields are checked in route order (`MissingField` names the
//!    first absent one),
//! 3. referenced parents must be live (`NotFound`),
//! 4. protected and immutable fields are dropped silently.
//!
//! An HTTP layer maps `is_not_found` errors to 404, `is_bad_request`
//! errors to 400 and everything else to 500. There is no routing,
//! authentication or transport concern in this crate.
//!
//! # Commit discipline
//!
//! Every mutating operation applies its in-memory change, then flushes the
//! full store. If the flush fails the in-memory change is rolled back
//! before the error surfaces, so memory and disk stay consistent and no
//! partial commit is ever acknowledged.
//!
//! # Example
//!
//! ```rust
//! use posada::catalog::Catalog;
//! use posada::store::MemStore;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::new(MemStore::new());
//!
//! let state = catalog.create_state(&json!({ "name": "California" })).await?;
//! let city = catalog.create_city(&state.id, &json!({ "name": "Fremont" })).await?;
//!
//! let cities = catalog.cities_of_state(&state.id).await?;
//! assert_eq!(cities.len(), 1);
//! assert_eq!(cities[0].id, city.id);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::ENTITY_KINDS_COUNT;
use crate::relations::Relations;
use crate::store::{
    Amenity, ApplyError, City, Entity, EntityData, EntityKind, FileStore, Place, Review, State,
    StoreBackend, StoreError, User,
};

/// Collection names the stats report uses, paired with their kinds.
const STAT_COLLECTIONS: [(&str, EntityKind); ENTITY_KINDS_COUNT] = [
    ("amenities", EntityKind::Amenity),
    ("cities", EntityKind::City),
    ("places", EntityKind::Place),
    ("reviews", EntityKind::Review),
    ("states", EntityKind::State),
    ("users", EntityKind::User),
];

// =============================================================================
// Error Types
// =============================================================================

/// Errors from catalog operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Requested or referenced entity is not live
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind that was looked up
        kind: EntityKind,
        /// Id that failed to resolve
        id: String,
    },

    /// Request body is not a JSON object
    #[error("request body is not a JSON object")]
    NotJson,

    /// A required field is absent from the request body
    #[error("missing {field}")]
    MissingField {
        /// The absent field
        field: &'static str,
    },

    /// A supplied field value has the wrong type or exceeds limits
    #[error("invalid value for field {field}")]
    InvalidField {
        /// The offending field
        field: String,
    },

    /// Request body could not be read into the entity schema
    #[error("malformed request body: {message}")]
    BadPayload {
        /// Deserializer error message
        message: String,
    },

    /// The storage engine failed; fatal to the in-flight request
    #[error("storage error: {message}")]
    Storage {
        /// Underlying storage error message
        message: String,
    },
}

impl CatalogError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create a bad payload error.
    #[must_use]
    pub fn bad_payload(message: impl Into<String>) -> Self {
        Self::BadPayload {
            message: message.into(),
        }
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Check if this error maps to a 404-equivalent response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error maps to a 400-equivalent response.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::NotJson | Self::MissingField { .. } | Self::InvalidField { .. } | Self::BadPayload { .. }
        )
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference { kind, id } => Self::NotFound { kind, id },
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

impl From<ApplyError> for CatalogError {
    fn from(err: ApplyError) -> Self {
        Self::InvalidField {
            field: err.field().to_string(),
        }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Body Helpers
// =============================================================================

fn as_object(body: &Value) -> CatalogResult<&Map<String, Value>> {
    body.as_object().ok_or(CatalogError::NotJson)
}

fn require<'a>(body: &'a Map<String, Value>, field: &'static str) -> CatalogResult<&'a Value> {
    body.get(field).ok_or(CatalogError::MissingField { field })
}

fn parse_payload<T: serde::de::DeserializeOwned>(body: &Map<String, Value>) -> CatalogResult<T> {
    serde_json::from_value(Value::Object(body.clone()))
        .map_err(|err| CatalogError::bad_payload(err.to_string()))
}

// =============================================================================
// Catalog
// =============================================================================

/// Main interface over the catalog store.
///
/// Generic over the storage backend: `FileStore` for a durable catalog,
/// `MemStore` for tests and examples. The backend is cloned into the
/// relationship resolver; clones share the live map.
pub struct Catalog<S: StoreBackend> {
    store: S,
    relations: Relations<S>,
}

impl Catalog<FileStore> {
    /// Open a durable catalog backed by the JSON document at `path`.
    ///
    /// The document is loaded immediately; missing or corrupt documents
    /// yield an empty catalog.
    pub async fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        Ok(Self::new(FileStore::open(path).await?))
    }
}

impl<S: StoreBackend + Clone> Catalog<S> {
    /// Create a catalog over a backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        let relations = Relations::new(store.clone());
        Self { store, relations }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the relationship resolver.
    #[must_use]
    pub fn relations(&self) -> &Relations<S> {
        &self.relations
    }

    /// Flush and release the storage backend at end of scope.
    pub async fn close(&self) -> CatalogResult<()> {
        Ok(self.store.close().await?)
    }

    /// Live entity counts per collection, keyed by collection name.
    pub async fn stats(&self) -> CatalogResult<BTreeMap<&'static str, usize>> {
        let mut stats = BTreeMap::new();
        for (collection, kind) in STAT_COLLECTIONS {
            stats.insert(collection, self.store.count(kind).await?);
        }
        Ok(stats)
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    async fn fetch(&self, kind: EntityKind, id: &str) -> CatalogResult<Entity> {
        self.store
            .get(kind, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(kind, id))
    }

    async fn list(&self, kind: EntityKind) -> CatalogResult<Vec<Entity>> {
        Ok(self.store.all(kind).await?.into_values().collect())
    }

    /// Insert then flush; roll the insert back if the flush fails.
    async fn commit_insert(&self, entity: Entity) -> CatalogResult<Entity> {
        entity.data.validate()?;
        self.store.insert(&entity).await?;

        if let Err(err) = self.store.save().await {
            if let Err(rollback) = self.store.delete(entity.kind(), &entity.id).await {
                tracing::error!(
                    error = %rollback,
                    key = %entity.key(),
                    "rollback after failed flush also failed"
                );
            }
            return Err(err.into());
        }
        Ok(entity)
    }

    /// Write back then flush; restore the previous entity if the flush fails.
    async fn commit_update(&self, before: Entity, after: Entity) -> CatalogResult<Entity> {
        after.data.validate()?;
        self.store.update(&after).await?;

        if let Err(err) = self.store.save().await {
            if let Err(rollback) = self.store.update(&before).await {
                tracing::error!(
                    error = %rollback,
                    key = %before.key(),
                    "rollback after failed flush also failed"
                );
            }
            return Err(err.into());
        }
        Ok(after)
    }

    /// Delete then flush; reinsert if the flush fails.
    ///
    /// Reinsertion re-runs foreign-key checks and can itself fail for an
    /// orphaned entity; that double failure is logged and the flush error
    /// still surfaces.
    async fn commit_delete(&self, entity: Entity) -> CatalogResult<()> {
        self.store.delete(entity.kind(), &entity.id).await?;

        if let Err(err) = self.store.save().await {
            if let Err(rollback) = self.store.insert(&entity).await {
                tracing::error!(
                    error = %rollback,
                    key = %entity.key(),
                    "rollback after failed flush also failed"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn update_entity(&self, kind: EntityKind, id: &str, body: &Value) -> CatalogResult<Entity> {
        let before = self.fetch(kind, id).await?;
        let body = as_object(body)?;

        let mut after = before.clone();
        after.apply(body)?;
        self.commit_update(before, after).await
    }

    async fn delete_entity(&self, kind: EntityKind, id: &str) -> CatalogResult<()> {
        let entity = self.fetch(kind, id).await?;
        self.commit_delete(entity).await
    }

    // =========================================================================
    // States
    // =========================================================================

    /// All states.
    pub async fn list_states(&self) -> CatalogResult<Vec<Entity>> {
        self.list(EntityKind::State).await
    }

    /// Get a state by id.
    pub async fn get_state(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::State, id).await
    }

    /// Create a state. Requires `name`.
    pub async fn create_state(&self, body: &Value) -> CatalogResult<Entity> {
        let body = as_object(body)?;
        require(body, "name")?;

        let payload: State = parse_payload(body)?;
        self.commit_insert(Entity::new(EntityData::State(payload))).await
    }

    /// Update a state.
    pub async fn update_state(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::State, id, body).await
    }

    /// Delete a state. Its cities are not cascaded and become orphans.
    pub async fn delete_state(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::State, id).await
    }

    // =========================================================================
    // Cities
    // =========================================================================

    /// Cities of a state.
    pub async fn cities_of_state(&self, state_id: &str) -> CatalogResult<Vec<Entity>> {
        self.fetch(EntityKind::State, state_id).await?;
        Ok(self.relations.cities_of_state(state_id).await?)
    }

    /// Create a city under a state. Requires `name`; `state_id` comes from
    /// the parent and overrides any client-supplied value.
    pub async fn create_city(&self, state_id: &str, body: &Value) -> CatalogResult<Entity> {
        self.fetch(EntityKind::State, state_id).await?;
        let body = as_object(body)?;
        require(body, "name")?;

        let mut body = body.clone();
        body.insert("state_id".to_string(), Value::String(state_id.to_string()));
        let payload: City = parse_payload(&body)?;
        self.commit_insert(Entity::new(EntityData::City(payload))).await
    }

    /// Get a city by id.
    pub async fn get_city(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::City, id).await
    }

    /// Update a city. `state_id` is immutable.
    pub async fn update_city(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::City, id, body).await
    }

    /// Delete a city. Its places are not cascaded.
    pub async fn delete_city(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::City, id).await
    }

    // =========================================================================
    // Amenities
    // =========================================================================

    /// All amenities.
    pub async fn list_amenities(&self) -> CatalogResult<Vec<Entity>> {
        self.list(EntityKind::Amenity).await
    }

    /// Get an amenity by id.
    pub async fn get_amenity(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::Amenity, id).await
    }

    /// Create an amenity. Requires `name`.
    pub async fn create_amenity(&self, body: &Value) -> CatalogResult<Entity> {
        let body = as_object(body)?;
        require(body, "name")?;

        let payload: Amenity = parse_payload(body)?;
        self.commit_insert(Entity::new(EntityData::Amenity(payload))).await
    }

    /// Update an amenity.
    pub async fn update_amenity(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::Amenity, id, body).await
    }

    /// Delete an amenity. Places keep their link ids; resolution skips them.
    pub async fn delete_amenity(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::Amenity, id).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// All users.
    pub async fn list_users(&self) -> CatalogResult<Vec<Entity>> {
        self.list(EntityKind::User).await
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::User, id).await
    }

    /// Create a user. Requires `email`, then `password`.
    pub async fn create_user(&self, body: &Value) -> CatalogResult<Entity> {
        let body = as_object(body)?;
        require(body, "email")?;
        require(body, "password")?;

        let payload: User = parse_payload(body)?;
        self.commit_insert(Entity::new(EntityData::User(payload))).await
    }

    /// Update a user. `email` is immutable.
    pub async fn update_user(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::User, id, body).await
    }

    /// Delete a user. Their places and reviews are not cascaded.
    pub async fn delete_user(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::User, id).await
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Places of a city.
    pub async fn places_of_city(&self, city_id: &str) -> CatalogResult<Vec<Entity>> {
        self.fetch(EntityKind::City, city_id).await?;
        Ok(self.relations.places_of_city(city_id).await?)
    }

    /// Create a place under a city. Requires `user_id` (which must resolve
    /// to a live user), then `name`; `city_id` comes from the parent and
    /// overrides any client-supplied value.
    pub async fn create_place(&self, city_id: &str, body: &Value) -> CatalogResult<Entity> {
        self.fetch(EntityKind::City, city_id).await?;
        let body = as_object(body)?;

        let user_id = require(body, "user_id")?;
        if let Some(user_id) = user_id.as_str() {
            self.fetch(EntityKind::User, user_id).await?;
        }
        require(body, "name")?;

        let mut body = body.clone();
        body.insert("city_id".to_string(), Value::String(city_id.to_string()));
        let payload: Place = parse_payload(&body)?;
        self.commit_insert(Entity::new(EntityData::Place(payload))).await
    }

    /// Get a place by id.
    pub async fn get_place(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::Place, id).await
    }

    /// Update a place. `city_id` and `user_id` are immutable.
    pub async fn update_place(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::Place, id, body).await
    }

    /// Delete a place. Its reviews are not cascaded.
    pub async fn delete_place(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::Place, id).await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Reviews of a place.
    pub async fn reviews_of_place(&self, place_id: &str) -> CatalogResult<Vec<Entity>> {
        self.fetch(EntityKind::Place, place_id).await?;
        Ok(self.relations.reviews_of_place(place_id).await?)
    }

    /// Create a review under a place. Requires `user_id` (which must resolve
    /// to a live user), then `text`; `place_id` comes from the parent and
    /// overrides any client-supplied value.
    pub async fn create_review(&self, place_id: &str, body: &Value) -> CatalogResult<Entity> {
        self.fetch(EntityKind::Place, place_id).await?;
        let body = as_object(body)?;

        let user_id = require(body, "user_id")?;
        if let Some(user_id) = user_id.as_str() {
            self.fetch(EntityKind::User, user_id).await?;
        }
        require(body, "text")?;

        let mut body = body.clone();
        body.insert("place_id".to_string(), Value::String(place_id.to_string()));
        let payload: Review = parse_payload(&body)?;
        self.commit_insert(Entity::new(EntityData::Review(payload))).await
    }

    /// Get a review by id.
    pub async fn get_review(&self, id: &str) -> CatalogResult<Entity> {
        self.fetch(EntityKind::Review, id).await
    }

    /// Update a review. `place_id` and `user_id` are immutable.
    pub async fn update_review(&self, id: &str, body: &Value) -> CatalogResult<Entity> {
        self.update_entity(EntityKind::Review, id, body).await
    }

    /// Delete a review.
    pub async fn delete_review(&self, id: &str) -> CatalogResult<()> {
        self.delete_entity(EntityKind::Review, id).await
    }

    // =========================================================================
    // Place <-> Amenity links
    // =========================================================================

    /// Live amenities linked to a place.
    pub async fn amenities_of_place(&self, place_id: &str) -> CatalogResult<Vec<Entity>> {
        let place = self.fetch(EntityKind::Place, place_id).await?;
        let Some(payload) = place.as_place() else {
            return Ok(Vec::new());
        };
        Ok(self.relations.amenities_of_place(payload).await?)
    }

    /// Link an amenity to a place.
    ///
    /// Returns the amenity and whether a new link was created; linking an
    /// already linked amenity is a no-op reported as `false`.
    pub async fn link_amenity(
        &self,
        place_id: &str,
        amenity_id: &str,
    ) -> CatalogResult<(Entity, bool)> {
        let place = self.fetch(EntityKind::Place, place_id).await?;
        let amenity = self.fetch(EntityKind::Amenity, amenity_id).await?;

        let already_linked = place
            .as_place()
            .is_some_and(|payload| payload.amenity_ids.iter().any(|id| id == amenity_id));
        if already_linked {
            return Ok((amenity, false));
        }

        let mut after = place.clone();
        if let Some(payload) = after.as_place_mut() {
            payload.amenity_ids.push(amenity_id.to_string());
        }
        after.touch();
        self.commit_update(place, after).await?;

        Ok((amenity, true))
    }

    /// Remove an amenity link from a place.
    ///
    /// An amenity that is live but not linked is a not-found condition,
    /// matching the lookup semantics of the nested route.
    pub async fn unlink_amenity(&self, place_id: &str, amenity_id: &str) -> CatalogResult<()> {
        let place = self.fetch(EntityKind::Place, place_id).await?;
        self.fetch(EntityKind::Amenity, amenity_id).await?;

        let linked = place
            .as_place()
            .is_some_and(|payload| payload.amenity_ids.iter().any(|id| id == amenity_id));
        if !linked {
            return Err(CatalogError::not_found(EntityKind::Amenity, amenity_id));
        }

        let mut after = place.clone();
        if let Some(payload) = after.as_place_mut() {
            payload.amenity_ids.retain(|id| id != amenity_id);
        }
        after.touch();
        self.commit_update(place, after).await?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use serde_json::json;

    fn catalog() -> Catalog<MemStore> {
        Catalog::new(MemStore::new())
    }

    /// Seed a state, city and user; the usual parents for places.
    async fn seeded() -> (Catalog<MemStore>, Entity, Entity, Entity) {
        let catalog = catalog();
        let state = catalog
            .create_state(&json!({ "name": "California" }))
            .await
            .unwrap();
        let city = catalog
            .create_city(&state.id, &json!({ "name": "Fremont" }))
            .await
            .unwrap();
        let user = catalog
            .create_user(&json!({ "email": "a@example.com", "password": "pw" }))
            .await
            .unwrap();
        (catalog, state, city, user)
    }

    async fn seeded_place() -> (Catalog<MemStore>, Entity, Entity) {
        let (catalog, _state, city, user) = seeded().await;
        let place = catalog
            .create_place(&city.id, &json!({ "user_id": user.id, "name": "Loft" }))
            .await
            .unwrap();
        (catalog, user, place)
    }

    // =========================================================================
    // Creation and validation
    // =========================================================================

    #[tokio::test]
    async fn test_create_state() {
        let catalog = catalog();

        let state = catalog
            .create_state(&json!({ "name": "California" }))
            .await
            .unwrap();

        assert!(!state.id.is_empty());
        assert_eq!(state.as_state().unwrap().name, "California");
        assert!(state.updated_at >= state.created_at);
    }

    #[tokio::test]
    async fn test_create_state_missing_name() {
        let catalog = catalog();

        let err = catalog.create_state(&json!({})).await.unwrap_err();
        assert_eq!(err, CatalogError::missing_field("name"));
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_create_state_body_not_object() {
        let catalog = catalog();

        let err = catalog.create_state(&json!("California")).await.unwrap_err();
        assert_eq!(err, CatalogError::NotJson);
    }

    #[tokio::test]
    async fn test_create_state_ignores_forged_id() {
        let catalog = catalog();

        let state = catalog
            .create_state(&json!({ "name": "California", "id": "forged" }))
            .await
            .unwrap();

        assert_ne!(state.id, "forged");
    }

    #[tokio::test]
    async fn test_create_user_required_field_order() {
        let catalog = catalog();

        let err = catalog.create_user(&json!({})).await.unwrap_err();
        assert_eq!(err, CatalogError::missing_field("email"));

        let err = catalog
            .create_user(&json!({ "email": "a@example.com" }))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::missing_field("password"));
    }

    #[tokio::test]
    async fn test_create_city_unknown_state() {
        let catalog = catalog();

        let err = catalog
            .create_city("missing", &json!({ "name": "Fremont" }))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_city_sets_state_from_parent() {
        let (catalog, state, _city, _user) = seeded().await;

        let city = catalog
            .create_city(&state.id, &json!({ "name": "Berkeley", "state_id": "forged" }))
            .await
            .unwrap();

        assert_eq!(city.as_city().unwrap().state_id, state.id);
    }

    #[tokio::test]
    async fn test_create_place_validation_order() {
        let (catalog, _state, city, user) = seeded().await;

        let err = catalog
            .create_place(&city.id, &json!({ "name": "Loft" }))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::missing_field("user_id"));

        let err = catalog
            .create_place(&city.id, &json!({ "user_id": "missing", "name": "Loft" }))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::not_found(EntityKind::User, "missing"));

        let err = catalog
            .create_place(&city.id, &json!({ "user_id": user.id }))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::missing_field("name"));
    }

    #[tokio::test]
    async fn test_create_review_rejects_unknown_user_without_write() {
        let (catalog, _user, place) = seeded_place().await;

        let err = catalog
            .create_review(&place.id, &json!({ "user_id": "missing", "text": "nice" }))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            catalog.store().count(EntityKind::Review).await.unwrap(),
            0,
            "a rejected write must leave no trace"
        );
    }

    #[tokio::test]
    async fn test_create_review_required_field_order() {
        let (catalog, user, place) = seeded_place().await;

        // user_id is checked before text, as the route does.
        let err = catalog
            .create_review(&place.id, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::missing_field("user_id"));

        let err = catalog
            .create_review(&place.id, &json!({ "user_id": user.id }))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::missing_field("text"));
    }

    #[tokio::test]
    async fn test_place_numeric_defaults() {
        let (catalog, _user, place) = seeded_place().await;

        let payload = place.as_place().unwrap();
        assert_eq!(payload.number_rooms, 0);
        assert_eq!(payload.price_by_night, 0);
        assert!(payload.amenity_ids.is_empty());
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[tokio::test]
    async fn test_get_absent_is_not_found() {
        let catalog = catalog();

        let err = catalog.get_state("missing").await.unwrap_err();
        assert_eq!(err, CatalogError::not_found(EntityKind::State, "missing"));
    }

    #[tokio::test]
    async fn test_nested_listing_checks_parent() {
        let catalog = catalog();

        let err = catalog.cities_of_state("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stats() {
        let (catalog, _user, _place) = seeded_place().await;

        let stats = catalog.stats().await.unwrap();
        assert_eq!(stats.len(), ENTITY_KINDS_COUNT);
        assert_eq!(stats["states"], 1);
        assert_eq!(stats["cities"], 1);
        assert_eq!(stats["users"], 1);
        assert_eq!(stats["places"], 1);
        assert_eq!(stats["reviews"], 0);
        assert_eq!(stats["amenities"], 0);
    }

    // =========================================================================
    // Updates
    // =========================================================================

    #[tokio::test]
    async fn test_update_protects_immutable_fields() {
        let (catalog, state, _city, _user) = seeded().await;

        let updated = catalog
            .update_state(
                &state.id,
                &json!({
                    "name": "Cascadia",
                    "id": "forged",
                    "created_at": "1999-01-01T00:00:00Z"
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, state.id);
        assert_eq!(updated.created_at, state.created_at);
        assert_eq!(updated.as_state().unwrap().name, "Cascadia");
        assert!(updated.updated_at >= state.updated_at);
    }

    #[tokio::test]
    async fn test_update_user_keeps_email() {
        let (catalog, _state, _city, user) = seeded().await;

        let updated = catalog
            .update_user(
                &user.id,
                &json!({ "email": "b@example.com", "first_name": "Ada" }),
            )
            .await
            .unwrap();

        let payload = updated.as_user().unwrap();
        assert_eq!(payload.email, "a@example.com");
        assert_eq!(payload.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_update_wrong_type_is_invalid_field() {
        let (catalog, state, _city, _user) = seeded().await;

        let err = catalog
            .update_state(&state.id, &json!({ "name": 7 }))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CatalogError::InvalidField {
                field: "name".to_string()
            }
        );
        assert!(err.is_bad_request());

        // The rejected update must not have landed.
        let current = catalog.get_state(&state.id).await.unwrap();
        assert_eq!(current.as_state().unwrap().name, "California");
    }

    // =========================================================================
    // Deletes and orphan tolerance
    // =========================================================================

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (catalog, _state, city, _user) = seeded().await;

        catalog.delete_city(&city.id).await.unwrap();

        let err = catalog.get_city(&city.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_state_orphans_cities() {
        let (catalog, state, city, _user) = seeded().await;

        catalog.delete_state(&state.id).await.unwrap();

        // The city survives and is still reachable by direct lookup and by
        // the resolver through the retained parent id.
        assert!(catalog.get_city(&city.id).await.is_ok());
        let orphans = catalog
            .relations()
            .cities_of_state(&state.id)
            .await
            .unwrap();
        assert_eq!(orphans.len(), 1);

        // The parent-checked listing now reports the state itself missing.
        assert!(catalog.cities_of_state(&state.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_count_matches_all_through_lifecycle() {
        let (catalog, _state, _city, _user) = seeded().await;

        for kind in EntityKind::all() {
            let count = catalog.store().count(*kind).await.unwrap();
            let all = catalog.store().all(*kind).await.unwrap();
            assert_eq!(count, all.len());
        }

        let states = catalog.list_states().await.unwrap();
        catalog.delete_state(&states[0].id).await.unwrap();

        for kind in EntityKind::all() {
            let count = catalog.store().count(*kind).await.unwrap();
            let all = catalog.store().all(*kind).await.unwrap();
            assert_eq!(count, all.len());
        }
    }

    // =========================================================================
    // Amenity links
    // =========================================================================

    #[tokio::test]
    async fn test_link_amenity_and_resolve() {
        let (catalog, _user, place) = seeded_place().await;
        let wifi = catalog
            .create_amenity(&json!({ "name": "Wifi" }))
            .await
            .unwrap();

        let (linked, created) = catalog.link_amenity(&place.id, &wifi.id).await.unwrap();
        assert!(created);
        assert_eq!(linked.id, wifi.id);

        let amenities = catalog.amenities_of_place(&place.id).await.unwrap();
        assert_eq!(amenities.len(), 1);

        // Linking again is a no-op.
        let (_, created) = catalog.link_amenity(&place.id, &wifi.id).await.unwrap();
        assert!(!created);
        let place = catalog.get_place(&place.id).await.unwrap();
        assert_eq!(place.as_place().unwrap().amenity_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_unlink_amenity() {
        let (catalog, _user, place) = seeded_place().await;
        let wifi = catalog
            .create_amenity(&json!({ "name": "Wifi" }))
            .await
            .unwrap();

        // Not linked yet: not found.
        let err = catalog.unlink_amenity(&place.id, &wifi.id).await.unwrap_err();
        assert!(err.is_not_found());

        catalog.link_amenity(&place.id, &wifi.id).await.unwrap();
        catalog.unlink_amenity(&place.id, &wifi.id).await.unwrap();

        let place = catalog.get_place(&place.id).await.unwrap();
        assert!(place.as_place().unwrap().amenity_ids.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_amenity_skipped_in_resolution() {
        let (catalog, _user, place) = seeded_place().await;
        let wifi = catalog
            .create_amenity(&json!({ "name": "Wifi" }))
            .await
            .unwrap();
        catalog.link_amenity(&place.id, &wifi.id).await.unwrap();

        catalog.delete_amenity(&wifi.id).await.unwrap();

        // The place keeps the dangling id; resolution skips it.
        let place = catalog.get_place(&place.id).await.unwrap();
        assert_eq!(place.as_place().unwrap().amenity_ids.len(), 1);
        assert!(catalog.amenities_of_place(&place.id).await.unwrap().is_empty());
    }
}
