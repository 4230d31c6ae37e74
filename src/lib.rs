//! # Posada
//!
//! A file-backed catalog store for property rentals: typed entities,
//! scan-based relationship resolution and atomic JSON persistence.
//!
//! ## Features
//!
//! - **Typed entity model**: six fixed entity kinds (State, City, Amenity,
//!   User, Place, Review) with uuid identity and creation/update timestamps
//! - **Composite-key store**: every live entity addressed by `<Kind>.<id>`,
//!   in memory and on disk, so reload needs no index rebuild
//! - **Referential checks**: foreign keys are verified at insert time; a
//!   dangling reference rejects the write as a not-found condition
//! - **No-cascade deletes**: dependents orphan and derived collections
//!   silently skip dangling references
//! - **Atomic persistence**: full-document rewrite to a temp file swapped
//!   into place, byte-identical for an unchanged store
//! - **Route-layer contract**: the `Catalog` facade owns the validation
//!   protocol a REST layer consumes, without any HTTP concern
//!
//! ## Quick Start
//!
//! ```rust
//! use posada::catalog::Catalog;
//! use posada::store::MemStore;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory catalog; use Catalog::open(path) for a durable one.
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
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Catalog Facade                       │
//! │   validation protocol, commit-with-rollback, stats       │
//! ├────────────────────────────┬────────────────────────────┤
//! │       Storage Engine       │    Relationship Resolver   │
//! │  (kind, id) -> Entity map  │   derived views by scan    │
//! │  insert/update/get/all/    │   state.cities,            │
//! │  count/delete/save/reload  │   place.reviews, ...       │
//! ├────────────────────────────┴────────────────────────────┤
//! │                      Entity Model                        │
//! │     typed payloads, update allow-lists, timestamps       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! - [`Catalog`](catalog::Catalog) - Main facade, coordinates validation,
//!   storage and resolution
//! - [`StoreBackend`](store::StoreBackend) - Storage abstraction with
//!   [`FileStore`](store::FileStore) (durable) and
//!   [`MemStore`](store::MemStore) (ephemeral) implementations
//! - [`Relations`](relations::Relations) - Derived collections without
//!   back-pointers
//! - [`Entity`](store::Entity) - Identity envelope plus typed payload

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod constants;
pub mod relations;
pub mod store;

// Re-export common types
pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use constants::*;
pub use relations::Relations;
pub use store::{
    Amenity, ApplyError, City, Entity, EntityData, EntityKind, FileStore, MemStore, Place, Review,
    State, StoreBackend, StoreError, StoreResult, User,
};
