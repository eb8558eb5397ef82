//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ArchiveService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use storytime_core::domain::{SavedStory, StoryRecord};
use storytime_core::error::{DeleteError, FetchError, SaveError};
use storytime_core::ports::ArchiveService;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ArchiveService` port.
#[derive(Clone)]
pub struct PgArchiveAdapter {
    pool: PgPool,
}

impl PgArchiveAdapter {
    /// Creates a new `PgArchiveAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StoryRow {
    id: Uuid,
    name: String,
    character: String,
    topic: String,
    body: String,
    image_url: Option<String>,
}

impl StoryRow {
    fn to_domain(self) -> StoryRecord {
        StoryRecord {
            id: Some(self.id),
            name: self.name,
            character: self.character,
            topic: self.topic,
            body: self.body,
            image_url: self.image_url,
        }
    }
}

//=========================================================================================
// `ArchiveService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ArchiveService for PgArchiveAdapter {
    async fn list(&self) -> Result<Vec<StoryRecord>, FetchError> {
        let rows = sqlx::query_as::<_, StoryRow>(
            "SELECT id, name, character, topic, body, image_url FROM stories ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FetchError::Service(e.to_string()))?;

        Ok(rows.into_iter().map(StoryRow::to_domain).collect())
    }

    async fn save(&self, record: &StoryRecord) -> Result<SavedStory, SaveError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO stories (id, name, character, topic, body, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.character)
        .bind(&record.topic)
        .bind(&record.body)
        .bind(&record.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| SaveError::Service(e.to_string()))?;

        Ok(SavedStory {
            id,
            message: "Story saved successfully".to_string(),
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), DeleteError> {
        // Zero rows affected means the id was already gone; the port treats
        // that as an idempotent success.
        sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DeleteError::Service(e.to_string()))?;
        Ok(())
    }
}
