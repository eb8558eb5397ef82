//! crates/storytime_core/src/browser.rs
//!
//! The archive browser: a state machine over the archived-story list with
//! circular next/previous navigation and delete-then-refetch consistency.
//! The browser exclusively owns its cached list and index; the list is
//! fully replaced on every fetch, never patched in place.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::StoryRecord;
use crate::error::{FetchError, StoryError};
use crate::ports::ArchiveService;

/// The browser's lifecycle.
///
/// `Loading` is observable between the start of a `show` and the arrival of
/// the list; `Visible` always holds a non-empty list and an index inside
/// it; `Empty` means the fetch succeeded but the archive holds nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserState {
    Hidden,
    Loading,
    Visible {
        stories: Vec<StoryRecord>,
        current: usize,
    },
    Empty,
}

pub struct ArchiveBrowser {
    archive: Arc<dyn ArchiveService>,
    state: BrowserState,
}

impl ArchiveBrowser {
    pub fn new(archive: Arc<dyn ArchiveService>) -> Self {
        Self {
            archive,
            state: BrowserState::Hidden,
        }
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    /// The record the user is looking at, if the browser is visible.
    pub fn current(&self) -> Option<&StoryRecord> {
        match &self.state {
            BrowserState::Visible { stories, current } => stories.get(*current),
            _ => None,
        }
    }

    /// Fetches the full archive list and makes the browser visible.
    ///
    /// On success the index starts at 0 (or the state becomes `Empty` for a
    /// zero-record archive); on failure the browser returns to `Hidden` and
    /// the error is surfaced to the caller.
    pub async fn show(&mut self) -> Result<(), FetchError> {
        self.state = BrowserState::Loading;
        match self.archive.list().await {
            Ok(stories) if stories.is_empty() => {
                self.state = BrowserState::Empty;
                Ok(())
            }
            Ok(stories) => {
                self.state = BrowserState::Visible {
                    stories,
                    current: 0,
                };
                Ok(())
            }
            Err(e) => {
                self.state = BrowserState::Hidden;
                Err(e)
            }
        }
    }

    /// Hides the browser. The cached list is dropped with the state; a
    /// later `show` re-fetches regardless, so staleness cannot leak.
    pub fn hide(&mut self) {
        if matches!(
            self.state,
            BrowserState::Visible { .. } | BrowserState::Empty
        ) {
            self.state = BrowserState::Hidden;
        }
    }

    /// Advances to the next story, wrapping at the end of the list. A
    /// no-op in any state but `Visible`.
    pub fn next(&mut self) {
        if let BrowserState::Visible { stories, current } = &mut self.state {
            *current = (*current + 1) % stories.len();
        }
    }

    /// Steps back to the previous story, wrapping at the start of the
    /// list. A no-op in any state but `Visible`.
    pub fn previous(&mut self) {
        if let BrowserState::Visible { stories, current } = &mut self.state {
            *current = (*current + stories.len() - 1) % stories.len();
        }
    }

    /// Deletes `id` from the archive, then unconditionally re-fetches the
    /// whole list instead of splicing the cached one, so the browser can
    /// never diverge from the archive's view of what exists. The delete
    /// completes before the reconciling fetch is issued; the index resets
    /// to 0.
    pub async fn remove(&mut self, id: Uuid) -> Result<(), StoryError> {
        if !matches!(self.state, BrowserState::Visible { .. }) {
            warn!("Ignoring remove({id}) while the archive browser is not visible");
            return Ok(());
        }
        self.archive.delete(id).await?;
        self.show().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeleteError;
    use crate::ports::ArchiveService;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeArchive {
        stories: Mutex<Vec<StoryRecord>>,
        list_calls: AtomicUsize,
        fail_list: Mutex<bool>,
    }

    impl FakeArchive {
        fn with_stories(count: usize) -> Self {
            let stories = (0..count)
                .map(|i| StoryRecord {
                    id: Some(Uuid::new_v4()),
                    name: format!("Child {i}"),
                    character: "dragon".to_string(),
                    topic: "friendship".to_string(),
                    body: format!("story {i}"),
                    image_url: None,
                })
                .collect();
            Self {
                stories: Mutex::new(stories),
                list_calls: AtomicUsize::new(0),
                fail_list: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl ArchiveService for FakeArchive {
        async fn list(&self) -> Result<Vec<StoryRecord>, FetchError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_list.lock().unwrap() {
                return Err(FetchError::Service("connection refused".to_string()));
            }
            Ok(self.stories.lock().unwrap().clone())
        }

        async fn save(
            &self,
            _record: &StoryRecord,
        ) -> Result<crate::domain::SavedStory, crate::error::SaveError> {
            unimplemented!("browser tests never save")
        }

        async fn delete(&self, id: Uuid) -> Result<(), DeleteError> {
            self.stories.lock().unwrap().retain(|s| s.id != Some(id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn full_cycle_of_next_returns_to_start() {
        let archive = Arc::new(FakeArchive::with_stories(4));
        let mut browser = ArchiveBrowser::new(archive);
        browser.show().await.unwrap();

        let start = browser.current().cloned();
        for _ in 0..4 {
            browser.next();
        }
        assert_eq!(browser.current().cloned(), start);

        for _ in 0..4 {
            browser.previous();
        }
        assert_eq!(browser.current().cloned(), start);
    }

    #[tokio::test]
    async fn next_then_previous_is_identity() {
        for len in [1, 2, 5] {
            let archive = Arc::new(FakeArchive::with_stories(len));
            let mut browser = ArchiveBrowser::new(archive);
            browser.show().await.unwrap();

            let start = browser.current().cloned();
            browser.next();
            browser.previous();
            assert_eq!(browser.current().cloned(), start);

            browser.previous();
            browser.next();
            assert_eq!(browser.current().cloned(), start);
        }
    }

    #[tokio::test]
    async fn single_story_always_stays_current() {
        let archive = Arc::new(FakeArchive::with_stories(1));
        let mut browser = ArchiveBrowser::new(archive);
        browser.show().await.unwrap();

        let only = browser.current().cloned();
        browser.next();
        assert_eq!(browser.current().cloned(), only);
        browser.previous();
        assert_eq!(browser.current().cloned(), only);
    }

    #[tokio::test]
    async fn empty_archive_shows_empty_state_and_navigation_is_safe() {
        let archive = Arc::new(FakeArchive::with_stories(0));
        let mut browser = ArchiveBrowser::new(archive);
        browser.show().await.unwrap();

        assert_eq!(*browser.state(), BrowserState::Empty);
        assert!(browser.current().is_none());
        browser.next();
        browser.previous();
        assert_eq!(*browser.state(), BrowserState::Empty);
    }

    #[tokio::test]
    async fn failed_fetch_returns_to_hidden() {
        let archive = Arc::new(FakeArchive::with_stories(3));
        *archive.fail_list.lock().unwrap() = true;
        let mut browser = ArchiveBrowser::new(archive.clone());

        assert!(browser.show().await.is_err());
        assert_eq!(*browser.state(), BrowserState::Hidden);
    }

    #[tokio::test]
    async fn remove_refetches_exactly_once_and_resets_the_index() {
        let archive = Arc::new(FakeArchive::with_stories(3));
        let mut browser = ArchiveBrowser::new(archive.clone());
        browser.show().await.unwrap();
        browser.next();
        browser.next();

        // Remove a record that is not the currently-indexed one; the
        // refetch policy applies all the same.
        let victim = match browser.state() {
            BrowserState::Visible { stories, .. } => stories[0].id.unwrap(),
            _ => unreachable!(),
        };
        browser.remove(victim).await.unwrap();

        assert_eq!(archive.list_calls.load(Ordering::SeqCst), 2);
        match browser.state() {
            BrowserState::Visible { stories, current } => {
                assert_eq!(stories.len(), 2);
                assert_eq!(*current, 0);
                assert!(stories.iter().all(|s| s.id != Some(victim)));
            }
            state => panic!("expected Visible, got {state:?}"),
        }
    }

    #[tokio::test]
    async fn removing_the_last_story_lands_in_empty() {
        let archive = Arc::new(FakeArchive::with_stories(1));
        let mut browser = ArchiveBrowser::new(archive);
        browser.show().await.unwrap();

        let only = match browser.state() {
            BrowserState::Visible { stories, .. } => stories[0].id.unwrap(),
            _ => unreachable!(),
        };
        browser.remove(only).await.unwrap();
        assert_eq!(*browser.state(), BrowserState::Empty);
    }

    #[tokio::test]
    async fn remove_is_a_no_op_while_hidden() {
        let archive = Arc::new(FakeArchive::with_stories(2));
        let mut browser = ArchiveBrowser::new(archive.clone());

        browser.remove(Uuid::new_v4()).await.unwrap();
        assert_eq!(archive.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*browser.state(), BrowserState::Hidden);
    }
}
