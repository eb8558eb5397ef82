//! crates/storytime_core/src/error.rs
//!
//! The error taxonomy for the core. Each external-service failure gets its
//! own type so callers can report precisely which user-initiated operation
//! went wrong; none of these are process-fatal.

/// Story generation failed at the generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Story generation failed: {0}")]
    Service(String),
}

/// Saving a story to the archive failed.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The caller tried to save before a story body existed.
    #[error("There is no story to save yet")]
    EmptyStory,
    #[error("Saving the story failed: {0}")]
    Service(String),
}

/// Fetching the archived story list failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Fetching archived stories failed: {0}")]
    Service(String),
}

/// Deleting an archived story failed.
///
/// Deleting an id the archive no longer knows is *not* an error; the
/// archive port treats that as an idempotent success.
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("Deleting the story failed: {0}")]
    Service(String),
}

/// Capturing the illustration raster failed.
///
/// Always recoverable: the export degrades to a text-only document.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Downloading the illustration failed: {0}")]
    Fetch(String),
    #[error("Decoding the illustration failed: {0}")]
    Decode(String),
}

/// A precondition violation inside the document composer, fatal to the
/// single export attempt that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Page geometry leaves no usable area ({width:.1} x {height:.1})")]
    UnusableArea { width: f32, height: f32 },
    #[error("Writing the document failed: {0}")]
    Render(String),
}

/// Umbrella error for operations that can fail at more than one boundary,
/// e.g. `remove` (delete + reconciling fetch) or an export (capture +
/// layout). Service-layer code matches on this to pick a status code.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Delete(#[from] DeleteError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// An export was requested with no current story to export.
    #[error("There is no story to export")]
    NoStory,
}
