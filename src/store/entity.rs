//! Entity Model - Typed Records for the Catalog
//!
//! `TigerStyle`: Explicit types, explicit field allow-lists.
//!
//! Every catalog object is an [`Entity`]: a fixed payload struct for its
//! kind wrapped in an envelope carrying the identity fields shared by all
//! kinds (`id`, `created_at`, `updated_at`). Entities serialize to a flat
//! mapping with a `kind` discriminator, which is also the shape of the
//! persisted document values.
//!
//! Client-supplied bodies are JSON objects. Unknown keys are ignored, the
//! protected keys (`id`, `created_at`, `updated_at`) are dropped, and each
//! kind declares which of its fields an update may touch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::{FIELD_STRING_BYTES_MAX, PLACE_AMENITY_IDS_COUNT_MAX};

/// Keys owned by the envelope; never writable from a request body.
const PROTECTED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

// =============================================================================
// Entity Kind
// =============================================================================

/// Kinds of entities in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Top of the geography tree
    State,
    /// Belongs to one state, holds places
    City,
    /// Feature a place can offer
    Amenity,
    /// Account that owns places and reviews
    User,
    /// Rentable property
    Place,
    /// Text left by a user on a place
    Review,
}

impl EntityKind {
    /// Get string representation, as used in composite keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "State",
            Self::City => "City",
            Self::Amenity => "Amenity",
            Self::User => "User",
            Self::Place => "Place",
            Self::Review => "Review",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "state" => Some(Self::State),
            "city" => Some(Self::City),
            "amenity" => Some(Self::Amenity),
            "user" => Some(Self::User),
            "place" => Some(Self::Place),
            "review" => Some(Self::Review),
            _ => None,
        }
    }

    /// Get all entity kinds in order.
    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[
            Self::State,
            Self::City,
            Self::Amenity,
            Self::User,
            Self::Place,
            Self::Review,
        ]
    }

    /// Build the composite `<Kind>.<id>` key addressing an entity store-wide.
    #[must_use]
    pub fn key(self, id: &str) -> String {
        format!("{}.{id}", self.as_str())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Apply Errors
// =============================================================================

/// Error applying a client-supplied field value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    /// Value has the wrong JSON type for the field
    #[error("field {field} has an invalid type")]
    WrongType {
        /// Field the bad value was supplied for
        field: String,
    },

    /// Value exceeds the size limits for the field
    #[error("field {field} exceeds size limits")]
    TooLarge {
        /// Field the oversized value was supplied for
        field: String,
    },
}

impl ApplyError {
    /// Create a wrong type error.
    #[must_use]
    pub fn wrong_type(field: impl Into<String>) -> Self {
        Self::WrongType {
            field: field.into(),
        }
    }

    /// Create a too large error.
    #[must_use]
    pub fn too_large(field: impl Into<String>) -> Self {
        Self::TooLarge {
            field: field.into(),
        }
    }

    /// Get the field the error names.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::WrongType { field } | Self::TooLarge { field } => field,
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// A state, the top of the geography tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Display name
    pub name: String,
}

/// A city inside a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Display name
    pub name: String,
    /// Id of the owning state
    pub state_id: String,
}

/// A feature places can offer (wifi, parking, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    /// Display name
    pub name: String,
}

/// An account that owns places and writes reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Contact address, immutable after creation
    pub email: String,
    /// Stored as supplied; hashing is an outer-surface concern
    pub password: String,
    /// Optional given name
    #[serde(default)]
    pub first_name: String,
    /// Optional family name
    #[serde(default)]
    pub last_name: String,
}

/// A rentable property inside a city, owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Display name
    pub name: String,
    /// Id of the owning city
    pub city_id: String,
    /// Id of the owning user
    pub user_id: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Number of rooms
    #[serde(default)]
    pub number_rooms: i64,
    /// Number of bathrooms
    #[serde(default)]
    pub number_bathrooms: i64,
    /// Guest capacity
    #[serde(default)]
    pub max_guest: i64,
    /// Nightly price
    #[serde(default)]
    pub price_by_night: i64,
    /// Latitude of the property
    #[serde(default)]
    pub latitude: f64,
    /// Longitude of the property
    #[serde(default)]
    pub longitude: f64,
    /// Ids of linked amenities; entries may dangle and are skipped on read
    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

/// A review left by a user on a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review body
    pub text: String,
    /// Id of the reviewed place
    pub place_id: String,
    /// Id of the authoring user
    pub user_id: String,
}

// =============================================================================
// Field application
// =============================================================================

fn as_string(field: &str, value: &Value) -> Result<String, ApplyError> {
    let Some(text) = value.as_str() else {
        return Err(ApplyError::wrong_type(field));
    };
    if text.len() > FIELD_STRING_BYTES_MAX {
        return Err(ApplyError::too_large(field));
    }
    Ok(text.to_string())
}

fn as_int(field: &str, value: &Value) -> Result<i64, ApplyError> {
    value.as_i64().ok_or_else(|| ApplyError::wrong_type(field))
}

fn as_float(field: &str, value: &Value) -> Result<f64, ApplyError> {
    value.as_f64().ok_or_else(|| ApplyError::wrong_type(field))
}

fn as_id_list(field: &str, value: &Value) -> Result<Vec<String>, ApplyError> {
    let Some(items) = value.as_array() else {
        return Err(ApplyError::wrong_type(field));
    };
    if items.len() > PLACE_AMENITY_IDS_COUNT_MAX {
        return Err(ApplyError::too_large(field));
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ApplyError::wrong_type(field))
        })
        .collect()
}

fn check_str(field: &str, value: &str) -> Result<(), ApplyError> {
    if value.len() > FIELD_STRING_BYTES_MAX {
        return Err(ApplyError::too_large(field));
    }
    Ok(())
}

impl State {
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "name" => {
                self.name = as_string(field, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl City {
    // state_id is fixed by the parent route; not in the allow-list.
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "name" => {
                self.name = as_string(field, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Amenity {
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "name" => {
                self.name = as_string(field, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl User {
    // email is immutable after creation.
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "password" => self.password = as_string(field, value)?,
            "first_name" => self.first_name = as_string(field, value)?,
            "last_name" => self.last_name = as_string(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Place {
    // city_id and user_id are fixed at creation; not in the allow-list.
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "name" => self.name = as_string(field, value)?,
            "description" => self.description = as_string(field, value)?,
            "number_rooms" => self.number_rooms = as_int(field, value)?,
            "number_bathrooms" => self.number_bathrooms = as_int(field, value)?,
            "max_guest" => self.max_guest = as_int(field, value)?,
            "price_by_night" => self.price_by_night = as_int(field, value)?,
            "latitude" => self.latitude = as_float(field, value)?,
            "longitude" => self.longitude = as_float(field, value)?,
            "amenity_ids" => self.amenity_ids = as_id_list(field, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Review {
    // place_id and user_id are fixed at creation; not in the allow-list.
    fn apply_field(&mut self, field: &str, value: &Value) -> Result<bool, ApplyError> {
        match field {
            "text" => {
                self.text = as_string(field, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// =============================================================================
// Entity Data
// =============================================================================

/// Per-kind payload, internally tagged with the `kind` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EntityData {
    /// State payload
    State(State),
    /// City payload
    City(City),
    /// Amenity payload
    Amenity(Amenity),
    /// User payload
    User(User),
    /// Place payload
    Place(Place),
    /// Review payload
    Review(Review),
}

impl EntityData {
    /// Kind of this payload.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::State(_) => EntityKind::State,
            Self::City(_) => EntityKind::City,
            Self::Amenity(_) => EntityKind::Amenity,
            Self::User(_) => EntityKind::User,
            Self::Place(_) => EntityKind::Place,
            Self::Review(_) => EntityKind::Review,
        }
    }

    /// Check every externally supplied value against the size limits.
    ///
    /// Creation bodies deserialize directly into payload structs, so the
    /// per-field conversions in `apply_field` never saw them.
    pub(crate) fn validate(&self) -> Result<(), ApplyError> {
        match self {
            Self::State(State { name }) | Self::Amenity(Amenity { name }) => {
                check_str("name", name)
            }
            Self::City(city) => {
                check_str("name", &city.name)?;
                check_str("state_id", &city.state_id)
            }
            Self::User(user) => {
                check_str("email", &user.email)?;
                check_str("password", &user.password)?;
                check_str("first_name", &user.first_name)?;
                check_str("last_name", &user.last_name)
            }
            Self::Place(place) => {
                check_str("name", &place.name)?;
                check_str("city_id", &place.city_id)?;
                check_str("user_id", &place.user_id)?;
                check_str("description", &place.description)?;
                if place.amenity_ids.len() > PLACE_AMENITY_IDS_COUNT_MAX {
                    return Err(ApplyError::too_large("amenity_ids"));
                }
                for id in &place.amenity_ids {
                    check_str("amenity_ids", id)?;
                }
                Ok(())
            }
            Self::Review(review) => {
                check_str("text", &review.text)?;
                check_str("place_id", &review.place_id)?;
                check_str("user_id", &review.user_id)
            }
        }
    }
}

// =============================================================================
// Entity
// =============================================================================

/// One live catalog record: identity envelope plus typed payload.
///
/// Serializes flat, so a stored state looks like:
///
/// ```json
/// {
///   "id": "87e59b3f-...",
///   "created_at": "2026-08-05T12:00:00Z",
///   "updated_at": "2026-08-05T12:00:00Z",
///   "kind": "State",
///   "name": "California"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (UUID v4), immutable
    pub id: String,
    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Typed payload with the `kind` discriminator
    #[serde(flatten)]
    pub data: EntityData,
}

impl Entity {
    /// Create a new entity with a fresh id and current timestamps.
    #[must_use]
    pub fn new(data: EntityData) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            data,
        }
    }

    /// Kind of this entity.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    /// Composite `<Kind>.<id>` key addressing this entity store-wide.
    #[must_use]
    pub fn key(&self) -> String {
        self.kind().key(&self.id)
    }

    /// Foreign-key pairs that must resolve to live entities at insert time.
    ///
    /// `amenity_ids` is deliberately absent: amenity links may dangle and
    /// are skipped when resolved.
    #[must_use]
    pub fn references(&self) -> Vec<(EntityKind, &str)> {
        match &self.data {
            EntityData::State(_) | EntityData::Amenity(_) | EntityData::User(_) => Vec::new(),
            EntityData::City(city) => vec![(EntityKind::State, city.state_id.as_str())],
            EntityData::Place(place) => vec![
                (EntityKind::City, place.city_id.as_str()),
                (EntityKind::User, place.user_id.as_str()),
            ],
            EntityData::Review(review) => vec![
                (EntityKind::Place, review.place_id.as_str()),
                (EntityKind::User, review.user_id.as_str()),
            ],
        }
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a client-supplied update body through the per-kind allow-list.
    ///
    /// Protected keys and keys outside the allow-list are dropped silently;
    /// a value of the wrong type or size fails with the field named.
    /// `updated_at` is refreshed whether or not any field changed.
    pub fn apply(&mut self, body: &Map<String, Value>) -> Result<(), ApplyError> {
        for (field, value) in body {
            if PROTECTED_FIELDS.contains(&field.as_str()) {
                tracing::debug!(field = %field, "dropping protected field from update");
                continue;
            }
            let applied = match &mut self.data {
                EntityData::State(state) => state.apply_field(field, value)?,
                EntityData::City(city) => city.apply_field(field, value)?,
                EntityData::Amenity(amenity) => amenity.apply_field(field, value)?,
                EntityData::User(user) => user.apply_field(field, value)?,
                EntityData::Place(place) => place.apply_field(field, value)?,
                EntityData::Review(review) => review.apply_field(field, value)?,
            };
            if !applied {
                tracing::debug!(field = %field, "ignoring unknown or immutable field");
            }
        }
        self.touch();
        Ok(())
    }

    /// Get the state payload, if this is a state.
    #[must_use]
    pub fn as_state(&self) -> Option<&State> {
        match &self.data {
            EntityData::State(state) => Some(state),
            _ => None,
        }
    }

    /// Get the city payload, if this is a city.
    #[must_use]
    pub fn as_city(&self) -> Option<&City> {
        match &self.data {
            EntityData::City(city) => Some(city),
            _ => None,
        }
    }

    /// Get the amenity payload, if this is an amenity.
    #[must_use]
    pub fn as_amenity(&self) -> Option<&Amenity> {
        match &self.data {
            EntityData::Amenity(amenity) => Some(amenity),
            _ => None,
        }
    }

    /// Get the user payload, if this is a user.
    #[must_use]
    pub fn as_user(&self) -> Option<&User> {
        match &self.data {
            EntityData::User(user) => Some(user),
            _ => None,
        }
    }

    /// Get the place payload, if this is a place.
    #[must_use]
    pub fn as_place(&self) -> Option<&Place> {
        match &self.data {
            EntityData::Place(place) => Some(place),
            _ => None,
        }
    }

    /// Get the place payload mutably, if this is a place.
    #[must_use]
    pub fn as_place_mut(&mut self) -> Option<&mut Place> {
        match &mut self.data {
            EntityData::Place(place) => Some(place),
            _ => None,
        }
    }

    /// Get the review payload, if this is a review.
    #[must_use]
    pub fn as_review(&self) -> Option<&Review> {
        match &self.data {
            EntityData::Review(review) => Some(review),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
