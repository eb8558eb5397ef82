//! crates/storytime_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use uuid::Uuid;

/// The text+image+metadata unit that is generated, displayed, saved,
/// and exported.
///
/// A record is a *draft* while `id` is `None` (freshly generated, never
/// persisted) and *archived* once the archive service has assigned an id.
/// Drafts are discarded when a new generation starts; archived records
/// are frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRecord {
    pub id: Option<Uuid>,
    pub name: String,
    pub character: String,
    pub topic: String,
    pub body: String,
    pub image_url: Option<String>,
}

impl StoryRecord {
    /// True once the archive service owns a persisted copy of this record.
    pub fn is_archived(&self) -> bool {
        self.id.is_some()
    }
}

/// The raw output of the story-generation service.
///
/// A missing `image_url` is a valid partial success: the prose came back
/// but the illustration did not, and the story is treated as text-only.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    pub body: String,
    pub image_url: Option<String>,
}

/// A decoded raster illustration, captured from a story's `image_url`.
///
/// Pixels are tightly packed RGB8, row-major, `width * height * 3` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Confirmation returned by the archive service after a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedStory {
    pub id: Uuid,
    pub message: String,
}
