//! Adapters for the three external stores behind the post backend: a searchable
//! geo index, blob storage for images, and a wide-column audit log.
//!
//! Each store is an `async_trait` so the API layer can hold `Arc<dyn ...>` and
//! swap a managed service for a local backend through configuration.

pub mod audit;
pub mod bigtable;
pub mod elastic;
pub mod error;
pub mod gcs;
pub mod geo;
pub mod index;
pub mod local;
pub mod memory;
pub mod object;
pub mod sqlite;

pub use audit::{AuditStore, Mutation, SetCell};
pub use bigtable::BigtableAuditStore;
pub use elastic::ElasticIndex;
pub use error::{StoreError, StoreResult};
pub use gcs::GcsObjectStore;
pub use geo::Distance;
pub use index::{Hit, Query, SearchHits, SearchIndex};
pub use local::LocalObjectStore;
pub use memory::MemoryIndex;
pub use object::{ObjectAttrs, ObjectStore};
pub use sqlite::SqliteAuditStore;
