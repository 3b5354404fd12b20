//! Database query functions for the `planners` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Planner;

/// Parameters for inserting a generated plan.
#[derive(Debug, Clone)]
pub struct NewPlanner {
    pub session_id: Uuid,
    pub main_destination_name: String,
    pub main_destination_address: String,
    pub main_destination_latitude: Option<f64>,
    pub main_destination_longitude: Option<f64>,
    pub total_days: i32,
    pub daily_plans: serde_json::Value,
    pub overview: String,
}

/// Insert a plan row. `created_at` and `updated_at` take server defaults.
pub async fn insert_planner(pool: &PgPool, planner: &NewPlanner) -> Result<Planner> {
    let row = sqlx::query_as::<_, Planner>(
        "INSERT INTO planners (session_id, main_destination_name, main_destination_address, \
                               main_destination_latitude, main_destination_longitude, \
                               total_days, daily_plans, overview) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(planner.session_id)
    .bind(&planner.main_destination_name)
    .bind(&planner.main_destination_address)
    .bind(planner.main_destination_latitude)
    .bind(planner.main_destination_longitude)
    .bind(planner.total_days)
    .bind(&planner.daily_plans)
    .bind(&planner.overview)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert plan for session {}", planner.session_id))?;

    Ok(row)
}

/// Fetch the most recent plan created for a session.
pub async fn get_latest_planner_for_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<Planner>> {
    let row = sqlx::query_as::<_, Planner>(
        "SELECT * FROM planners \
         WHERE session_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch plan for session")?;

    Ok(row)
}

/// List every plan created for a session, oldest first.
pub async fn list_planners_for_session(pool: &PgPool, session_id: Uuid) -> Result<Vec<Planner>> {
    let rows = sqlx::query_as::<_, Planner>(
        "SELECT * FROM planners WHERE session_id = $1 ORDER BY created_at, id",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans for session")?;

    Ok(rows)
}
