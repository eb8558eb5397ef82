//! crates/storytime_core/src/session.rs
//!
//! The single owner of the application's mutable state: the current draft
//! story, the archive browser, and the generation sequence. Rendering and
//! transport code never touch these fields directly; every mutation goes
//! through the operations below.

use std::sync::Arc;

use tracing::info;

use crate::browser::ArchiveBrowser;
use crate::domain::{GeneratedStory, SavedStory, StoryRecord};
use crate::error::{GenerationError, SaveError};
use crate::ports::ArchiveService;

/// Ties a generation request to the sequence number it was issued under.
///
/// The generation call itself runs outside the session (the caller must not
/// hold the session across the await), so by the time its result arrives a
/// newer generation may already have started. The ticket lets
/// `complete_generation` recognize and discard such stale results.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    seq: u64,
    name: String,
    character: String,
    topic: String,
}

impl GenerationTicket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// What `complete_generation` did with the delivered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// The result became the current draft.
    Installed,
    /// A newer generation had already started; the result was dropped.
    Discarded,
}

pub struct StorySession {
    archive: Arc<dyn ArchiveService>,
    browser: ArchiveBrowser,
    draft: Option<StoryRecord>,
    generation_seq: u64,
}

impl StorySession {
    pub fn new(archive: Arc<dyn ArchiveService>) -> Self {
        Self {
            browser: ArchiveBrowser::new(archive.clone()),
            archive,
            draft: None,
            generation_seq: 0,
        }
    }

    /// The current draft story, if one has been generated this session.
    pub fn draft(&self) -> Option<&StoryRecord> {
        self.draft.as_ref()
    }

    pub fn browser(&self) -> &ArchiveBrowser {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut ArchiveBrowser {
        &mut self.browser
    }

    /// The record an export applies to: the draft if one exists, otherwise
    /// the archived story the browser is showing.
    pub fn exportable(&self) -> Option<&StoryRecord> {
        self.draft.as_ref().or_else(|| self.browser.current())
    }

    /// Starts a new generation: the previous draft is discarded and the
    /// sequence advances, invalidating any still-in-flight request.
    pub fn begin_generation(&mut self, name: &str, character: &str, topic: &str) -> GenerationTicket {
        self.draft = None;
        self.generation_seq += 1;
        GenerationTicket {
            seq: self.generation_seq,
            name: name.to_string(),
            character: character.to_string(),
            topic: topic.to_string(),
        }
    }

    /// Delivers the result of the generation issued under `ticket`.
    ///
    /// A stale ticket (a newer generation has since begun) discards the
    /// result, success or failure, and reports `Discarded`. A fresh
    /// failure propagates; a fresh success becomes the draft.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        outcome: Result<GeneratedStory, GenerationError>,
    ) -> Result<GenerationStatus, GenerationError> {
        if ticket.seq != self.generation_seq {
            info!(
                seq = ticket.seq,
                latest = self.generation_seq,
                "Discarding stale generation result"
            );
            return Ok(GenerationStatus::Discarded);
        }

        let story = outcome?;
        self.draft = Some(StoryRecord {
            id: None,
            name: ticket.name,
            character: ticket.character,
            topic: ticket.topic,
            body: story.body,
            image_url: story.image_url,
        });
        Ok(GenerationStatus::Installed)
    }

    /// Saves the current draft to the archive. Saving without a draft, or
    /// with a blank body, is rejected before the archive is contacted.
    pub async fn save(&mut self) -> Result<SavedStory, SaveError> {
        let draft = self.draft.as_ref().ok_or(SaveError::EmptyStory)?;
        if draft.body.trim().is_empty() {
            return Err(SaveError::EmptyStory);
        }
        self.archive.save(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeleteError, FetchError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct RecordingArchive {
        save_calls: AtomicUsize,
    }

    impl RecordingArchive {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                save_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ArchiveService for RecordingArchive {
        async fn list(&self) -> Result<Vec<StoryRecord>, FetchError> {
            Ok(Vec::new())
        }

        async fn save(&self, record: &StoryRecord) -> Result<SavedStory, SaveError> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            assert!(!record.body.trim().is_empty());
            Ok(SavedStory {
                id: Uuid::new_v4(),
                message: "Story saved successfully".to_string(),
            })
        }

        async fn delete(&self, _id: Uuid) -> Result<(), DeleteError> {
            Ok(())
        }
    }

    fn generated(body: &str) -> GeneratedStory {
        GeneratedStory {
            body: body.to_string(),
            image_url: Some("https://img.example/1.png".to_string()),
        }
    }

    #[test]
    fn fresh_generation_installs_the_draft() {
        let mut session = StorySession::new(RecordingArchive::new());
        let ticket = session.begin_generation("Mia", "astronaut", "Space");

        let status = session
            .complete_generation(ticket, Ok(generated("Mia flew to the moon.")))
            .unwrap();
        assert_eq!(status, GenerationStatus::Installed);

        let draft = session.draft().unwrap();
        assert_eq!(draft.name, "Mia");
        assert_eq!(draft.body, "Mia flew to the moon.");
        assert!(draft.id.is_none());
    }

    #[test]
    fn stale_generation_result_is_discarded() {
        let mut session = StorySession::new(RecordingArchive::new());
        let stale = session.begin_generation("Mia", "astronaut", "Space");
        let fresh = session.begin_generation("Theo", "dragon", "Friendship");

        let status = session
            .complete_generation(stale, Ok(generated("An old story.")))
            .unwrap();
        assert_eq!(status, GenerationStatus::Discarded);
        assert!(session.draft().is_none());

        let status = session
            .complete_generation(fresh, Ok(generated("A new story.")))
            .unwrap();
        assert_eq!(status, GenerationStatus::Installed);
        assert_eq!(session.draft().unwrap().name, "Theo");
    }

    #[test]
    fn stale_failure_is_swallowed_but_fresh_failure_propagates() {
        let mut session = StorySession::new(RecordingArchive::new());
        let stale = session.begin_generation("Mia", "astronaut", "Space");
        let fresh = session.begin_generation("Mia", "astronaut", "Space");

        let err = GenerationError::Service("timeout".to_string());
        assert_eq!(
            session.complete_generation(stale, Err(err)).unwrap(),
            GenerationStatus::Discarded
        );

        let err = GenerationError::Service("timeout".to_string());
        assert!(session.complete_generation(fresh, Err(err)).is_err());
        assert!(session.draft().is_none());
    }

    #[tokio::test]
    async fn saving_without_a_story_is_rejected_before_the_archive() {
        let archive = RecordingArchive::new();
        let mut session = StorySession::new(archive.clone());

        assert!(matches!(session.save().await, Err(SaveError::EmptyStory)));

        let ticket = session.begin_generation("Mia", "astronaut", "Space");
        session
            .complete_generation(ticket, Ok(generated("   ")))
            .unwrap();
        assert!(matches!(session.save().await, Err(SaveError::EmptyStory)));

        assert_eq!(archive.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn saving_a_draft_reaches_the_archive() {
        let archive = RecordingArchive::new();
        let mut session = StorySession::new(archive.clone());

        let ticket = session.begin_generation("Mia", "astronaut", "Space");
        session
            .complete_generation(ticket, Ok(generated("Mia flew to the moon.")))
            .unwrap();

        let saved = session.save().await.unwrap();
        assert_eq!(saved.message, "Story saved successfully");
        assert_eq!(archive.save_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn new_generation_discards_the_previous_draft() {
        let mut session = StorySession::new(RecordingArchive::new());

        let ticket = session.begin_generation("Mia", "astronaut", "Space");
        session
            .complete_generation(ticket, Ok(generated("First story.")))
            .unwrap();
        assert!(session.draft().is_some());

        session.begin_generation("Theo", "dragon", "Friendship");
        assert!(session.draft().is_none());
    }
}
