//! Storage - Entity Model and Backends
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StoreBackend Trait                       │
//! └─────────────────────────────────────────────────────────────┘
//!               ↑                               ↑
//!               │                               │
//!      ┌────────┴────────┐             ┌────────┴────────┐
//!      │    MemStore     │             │    FileStore    │
//!      │   (ephemeral)   │             │ (JSON document) │
//!      └─────────────────┘             └─────────────────┘
//! ```
//!
//! Both backends hold the live set in a single map keyed by the composite
//! `<Kind>.<id>` key; `FileStore` persists that map verbatim as one JSON
//! document and atomically rewrites it on every save.

mod backend;
mod entity;
mod error;
mod file;
mod mem;

pub use backend::StoreBackend;
pub use entity::{
    Amenity, ApplyError, City, Entity, EntityData, EntityKind, Place, Review, State, User,
};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use mem::MemStore;
