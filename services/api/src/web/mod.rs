pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary that
// builds the web server router.
pub use rest::{
    delete_story_handler, export_story_handler, generate_story_handler, health_handler,
    hide_stories_handler, next_story_handler, previous_story_handler, save_story_handler,
    show_stories_handler,
};
