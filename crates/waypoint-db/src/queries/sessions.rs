//! Database query functions for the `sessions` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Session;

/// Field overwrites for a session. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFields {
    pub main_purpose: Option<String>,
    pub people: Option<String>,
    pub day: Option<String>,
}

/// Outcome of an update that is only allowed while the session is open.
#[derive(Debug, Clone)]
pub enum GuardedUpdate {
    /// The update was applied; carries the updated row.
    Applied(Session),
    /// The session exists but is already finished; nothing was written.
    AlreadyFinished,
    /// No session with that ID.
    NotFound,
}

/// Insert a new session with the given trait mapping. Every other column
/// takes its server default.
pub async fn insert_session(pool: &PgPool, categories: &serde_json::Value) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (categories) VALUES ($1) RETURNING *",
    )
    .bind(categories)
    .fetch_one(pool)
    .await
    .context("failed to insert session")?;

    Ok(session)
}

/// Fetch a session by its ID.
pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch session")?;

    Ok(session)
}

/// List sessions, newest first.
pub async fn list_sessions(pool: &PgPool, limit: i64) -> Result<Vec<Session>> {
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list sessions")?;

    Ok(sessions)
}

/// Overwrite the given fields. Returns `None` if the session does not exist.
pub async fn update_session_fields(
    pool: &PgPool,
    id: Uuid,
    fields: &SessionFields,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        "UPDATE sessions \
         SET main_purpose = COALESCE($2, main_purpose), \
             people = COALESCE($3, people), \
             day = COALESCE($4, day) \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&fields.main_purpose)
    .bind(&fields.people)
    .bind(&fields.day)
    .fetch_optional(pool)
    .await
    .context("failed to update session fields")?;

    Ok(session)
}

/// Append one option to an open session.
///
/// The append and the `finished` check happen in a single statement, so
/// concurrent appends never overwrite each other and never land after the
/// session was finished.
pub async fn append_option(pool: &PgPool, id: Uuid, option: &str) -> Result<GuardedUpdate> {
    let session = sqlx::query_as::<_, Session>(
        "UPDATE sessions \
         SET options = array_append(options, $2) \
         WHERE id = $1 AND NOT finished \
         RETURNING *",
    )
    .bind(id)
    .bind(option)
    .fetch_optional(pool)
    .await
    .context("failed to append session option")?;

    resolve_guarded(pool, id, session).await
}

/// Transition an open session to finished.
pub async fn finish_session(pool: &PgPool, id: Uuid) -> Result<GuardedUpdate> {
    let session = sqlx::query_as::<_, Session>(
        "UPDATE sessions \
         SET finished = true \
         WHERE id = $1 AND NOT finished \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to finish session")?;

    resolve_guarded(pool, id, session).await
}

/// Distinguish "not found" from "already finished" after a guarded update
/// matched no row.
async fn resolve_guarded(
    pool: &PgPool,
    id: Uuid,
    updated: Option<Session>,
) -> Result<GuardedUpdate> {
    if let Some(session) = updated {
        return Ok(GuardedUpdate::Applied(session));
    }
    match get_session(pool, id).await? {
        None => Ok(GuardedUpdate::NotFound),
        Some(_) => Ok(GuardedUpdate::AlreadyFinished),
    }
}
