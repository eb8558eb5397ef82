pub mod capture;
pub mod db;
pub mod story_llm;

pub use capture::HttpImageCapture;
pub use db::PgArchiveAdapter;
pub use story_llm::OpenAiStoryAdapter;
