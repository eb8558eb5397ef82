//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use storytime_core::ports::{ImageCapture, StoryGenerator};
use storytime_core::session::StorySession;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all
/// handlers.
///
/// All mutable story state (the draft, the archive browser, the generation
/// sequence) lives in the single `StorySession` behind one async mutex, so
/// every mutation happens on one logical thread of control. Handlers must
/// not hold the lock across a generation call; the session's ticket scheme
/// depends on the lock being released there.
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn StoryGenerator>,
    pub capture: Arc<dyn ImageCapture>,
    pub session: Mutex<StorySession>,
}
