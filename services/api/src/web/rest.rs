//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storytime_core::browser::{ArchiveBrowser, BrowserState};
use storytime_core::domain::StoryRecord;
use storytime_core::error::{SaveError, StoryError};
use storytime_core::layout::{compose, PageGeometry};
use storytime_core::pdf::{export_file_name, render};
use storytime_core::session::GenerationStatus;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_story_handler,
        save_story_handler,
        show_stories_handler,
        delete_story_handler,
        export_story_handler,
    ),
    components(
        schemas(GenerateStoryRequest, StoryResponse, SaveStoryResponse, StoryPayload,
            ArchiveViewResponse, DeleteStoryResponse)
    ),
    tags(
        (name = "Storytime API", description = "API endpoints for the illustrated story generator.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The three creation parameters for a new story.
#[derive(Deserialize, ToSchema)]
pub struct GenerateStoryRequest {
    pub name: String,
    pub character: String,
    pub topic: String,
}

/// The freshly generated story returned to the caller.
#[derive(Serialize, ToSchema)]
pub struct StoryResponse {
    pub story: String,
    pub image_url: Option<String>,
}

/// The confirmation sent after a successful save.
#[derive(Serialize, ToSchema)]
pub struct SaveStoryResponse {
    pub message: String,
    pub story_id: Uuid,
}

/// One archived story, as the browser presents it.
#[derive(Serialize, ToSchema)]
pub struct StoryPayload {
    pub id: Option<Uuid>,
    pub name: String,
    pub character: String,
    pub topic: String,
    pub story: String,
    pub image_url: Option<String>,
}

impl StoryPayload {
    fn from_domain(record: &StoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            character: record.character.clone(),
            topic: record.topic.clone(),
            story: record.body.clone(),
            image_url: record.image_url.clone(),
        }
    }
}

/// The archive browser's current view: its state name, the cached list,
/// and the index of the story being shown (absent unless visible).
#[derive(Serialize, ToSchema)]
pub struct ArchiveViewResponse {
    pub state: String,
    pub stories: Vec<StoryPayload>,
    pub current: Option<usize>,
}

fn archive_view(browser: &ArchiveBrowser) -> ArchiveViewResponse {
    match browser.state() {
        BrowserState::Visible { stories, current } => ArchiveViewResponse {
            state: "visible".to_string(),
            stories: stories.iter().map(StoryPayload::from_domain).collect(),
            current: Some(*current),
        },
        BrowserState::Empty => ArchiveViewResponse {
            state: "empty".to_string(),
            stories: Vec::new(),
            current: None,
        },
        BrowserState::Loading => ArchiveViewResponse {
            state: "loading".to_string(),
            stories: Vec::new(),
            current: None,
        },
        BrowserState::Hidden => ArchiveViewResponse {
            state: "hidden".to_string(),
            stories: Vec::new(),
            current: None,
        },
    }
}

/// The confirmation sent after a delete, with the reconciled view.
#[derive(Serialize, ToSchema)]
pub struct DeleteStoryResponse {
    pub message: String,
    pub archive: ArchiveViewResponse,
}

/// Maps a core error to the status code and message a client sees. Every
/// failure is scoped to the single request that triggered it.
fn error_response(err: StoryError) -> (StatusCode, String) {
    error!("Request failed: {err}");
    let status = match &err {
        StoryError::Save(SaveError::EmptyStory) | StoryError::NoStory => StatusCode::BAD_REQUEST,
        StoryError::Layout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, err.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a new story from the three creation parameters.
///
/// The previous draft is discarded as soon as the request is accepted. If a
/// newer generation starts while this one is still in flight, this one's
/// result is discarded and the request reports a conflict.
#[utoipa::path(
    post,
    path = "/generate-story",
    request_body = GenerateStoryRequest,
    responses(
        (status = 200, description = "Story generated", body = StoryResponse),
        (status = 409, description = "Superseded by a newer generation"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn generate_story_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<GenerateStoryRequest>,
) -> Result<Json<StoryResponse>, (StatusCode, String)> {
    let ticket = {
        let mut session = app_state.session.lock().await;
        session.begin_generation(&request.name, &request.character, &request.topic)
    };

    // The generation call runs without the session lock so later requests
    // can supersede this one; the ticket decides whose result wins.
    let outcome = app_state
        .generator
        .generate(ticket.name(), ticket.character(), ticket.topic())
        .await;

    let mut session = app_state.session.lock().await;
    match session.complete_generation(ticket, outcome) {
        Ok(GenerationStatus::Installed) => match session.draft() {
            Some(draft) => Ok(Json(StoryResponse {
                story: draft.body.clone(),
                image_url: draft.image_url.clone(),
            })),
            None => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Draft missing after generation".to_string(),
            )),
        },
        Ok(GenerationStatus::Discarded) => Err((
            StatusCode::CONFLICT,
            "A newer story generation has superseded this one".to_string(),
        )),
        Err(e) => Err(error_response(e.into())),
    }
}

/// Save the current draft story to the archive.
#[utoipa::path(
    post,
    path = "/save-story",
    responses(
        (status = 200, description = "Story saved", body = SaveStoryResponse),
        (status = 400, description = "There is no story to save yet"),
        (status = 502, description = "The archive service failed")
    )
)]
pub async fn save_story_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<SaveStoryResponse>, (StatusCode, String)> {
    let mut session = app_state.session.lock().await;
    let saved = session.save().await.map_err(|e| error_response(e.into()))?;
    Ok(Json(SaveStoryResponse {
        message: saved.message,
        story_id: saved.id,
    }))
}

/// Show the archived stories: fetches the full list and opens the browser.
#[utoipa::path(
    get,
    path = "/stories",
    responses(
        (status = 200, description = "The archive view", body = ArchiveViewResponse),
        (status = 502, description = "Fetching the archive failed")
    )
)]
pub async fn show_stories_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ArchiveViewResponse>, (StatusCode, String)> {
    let mut session = app_state.session.lock().await;
    session
        .browser_mut()
        .show()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(archive_view(session.browser())))
}

/// Hide the archive browser.
pub async fn hide_stories_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    let mut session = app_state.session.lock().await;
    session.browser_mut().hide();
    StatusCode::NO_CONTENT
}

/// Step to the next archived story (circular).
pub async fn next_story_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ArchiveViewResponse> {
    let mut session = app_state.session.lock().await;
    session.browser_mut().next();
    Json(archive_view(session.browser()))
}

/// Step to the previous archived story (circular).
pub async fn previous_story_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ArchiveViewResponse> {
    let mut session = app_state.session.lock().await;
    session.browser_mut().previous();
    Json(archive_view(session.browser()))
}

/// Delete an archived story, then re-fetch the archive so the browser view
/// matches what the archive actually holds.
#[utoipa::path(
    delete,
    path = "/delete-story/{id}",
    params(
        ("id" = Uuid, Path, description = "The id of the story to delete")
    ),
    responses(
        (status = 200, description = "Story deleted and view reconciled", body = DeleteStoryResponse),
        (status = 502, description = "The delete or the reconciling fetch failed")
    )
)]
pub async fn delete_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteStoryResponse>, (StatusCode, String)> {
    let mut session = app_state.session.lock().await;
    session
        .browser_mut()
        .remove(id)
        .await
        .map_err(error_response)?;
    Ok(Json(DeleteStoryResponse {
        message: "Story deleted successfully".to_string(),
        archive: archive_view(session.browser()),
    }))
}

/// Export the current story as a paginated PDF.
///
/// The draft wins if one exists; otherwise the archived story the browser
/// is showing is exported. A failed illustration capture degrades the
/// export to text-only rather than failing it.
#[utoipa::path(
    get,
    path = "/export-story",
    responses(
        (status = 200, description = "The composed PDF", content_type = "application/pdf"),
        (status = 400, description = "There is no story to export"),
        (status = 500, description = "Composing or writing the document failed")
    )
)]
pub async fn export_story_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = {
        let session = app_state.session.lock().await;
        session
            .exportable()
            .cloned()
            .ok_or_else(|| error_response(StoryError::NoStory))?
    };

    let image = match &record.image_url {
        Some(url) => match app_state.capture.capture(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Illustration capture failed, exporting text-only: {e}");
                None
            }
        },
        None => None,
    };

    let geometry = PageGeometry::default();
    let document =
        compose(&record, &geometry, image.as_ref()).map_err(|e| error_response(e.into()))?;
    let bytes = render(&document, &geometry).map_err(|e| error_response(e.into()))?;

    let file_name = export_file_name(&record);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, bytes))
}

/// Root route, a plain liveness line.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "AI Story Generator API is running!" }))
}

//=========================================================================================
// Tests
//=========================================================================================
