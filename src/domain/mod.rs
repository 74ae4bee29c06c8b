//! Domain models for wf-export
//!
//! Pure value types shared by discovery, classification, fetching and
//! document rewriting. None of them perform I/O.

pub mod artifact;
pub mod mapping;
pub mod resource;
pub mod task;

pub use artifact::{ArtifactCategory, ArtifactDescriptor, ArtifactKind, FetchResult};
pub use mapping::PathMapping;
pub use resource::{ResourceDescriptor, ResourceKind};
pub use task::{LibraryKind, LibraryRef, TaskDescriptor, TaskKind, TaskPayload};
