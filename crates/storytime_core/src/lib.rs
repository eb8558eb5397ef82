pub mod browser;
pub mod domain;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod ports;
pub mod session;

pub use browser::{ArchiveBrowser, BrowserState};
pub use domain::{CapturedImage, GeneratedStory, SavedStory, StoryRecord};
pub use error::{
    CaptureError, DeleteError, FetchError, GenerationError, LayoutError, SaveError, StoryError,
};
pub use layout::{compose, Block, FontMetrics, FontStyle, Page, PageGeometry, PaginatedDocument};
pub use pdf::{export_file_name, render};
pub use ports::{ArchiveService, ImageCapture, StoryGenerator};
pub use session::{GenerationStatus, GenerationTicket, StorySession};
