//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (artifact files, datasets).

mod artifact_store;
mod dataset_source;

pub use artifact_store::ArtifactStore;
pub use dataset_source::DatasetSource;
