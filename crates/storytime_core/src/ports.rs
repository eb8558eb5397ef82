//! crates/storytime_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or generation APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CapturedImage, GeneratedStory, SavedStory, StoryRecord};
use crate::error::{CaptureError, DeleteError, FetchError, GenerationError, SaveError};

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Produces a fresh story (prose plus optional illustration reference) from
/// the three creation parameters.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// A body-only result (no `image_url`) is a valid partial success.
    async fn generate(
        &self,
        name: &str,
        character: &str,
        topic: &str,
    ) -> Result<GeneratedStory, GenerationError>;
}

/// The external system of record for saved stories.
///
/// The core never patches its cached view of this archive in place; after
/// any mutation it re-fetches the full list, so implementations only need
/// the three whole-archive operations below.
#[async_trait]
pub trait ArchiveService: Send + Sync {
    /// Returns every archived story, in archive order. An empty list is a
    /// success, not an error.
    async fn list(&self) -> Result<Vec<StoryRecord>, FetchError>;

    /// Persists a copy of `record` and returns the id the archive assigned.
    async fn save(&self, record: &StoryRecord) -> Result<SavedStory, SaveError>;

    /// Removes the story with `id`. Deleting an id the archive does not
    /// know is a success (idempotent delete).
    async fn delete(&self, id: Uuid) -> Result<(), DeleteError>;
}

/// Captures a story's illustration as a decoded raster buffer.
#[async_trait]
pub trait ImageCapture: Send + Sync {
    async fn capture(&self, url: &str) -> Result<CapturedImage, CaptureError>;
}
