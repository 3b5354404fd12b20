use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use waypoint_db::models::{Place, PlaceKind, Planner, Session};
use waypoint_db::queries::places::{self, NewPlace, PlaceFilter};
use waypoint_db::queries::planners::{self, NewPlanner};
use waypoint_db::queries::sessions::{self, GuardedUpdate, SessionFields};

use super::Store;

/// [`Store`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_session(&self, categories: &serde_json::Value) -> Result<Session> {
        sessions::insert_session(&self.pool, categories).await
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        sessions::get_session(&self.pool, id).await
    }

    async fn list_sessions(&self, limit: i64) -> Result<Vec<Session>> {
        sessions::list_sessions(&self.pool, limit).await
    }

    async fn update_session_fields(&self, id: Uuid, fields: &SessionFields) -> Result<Option<Session>> {
        sessions::update_session_fields(&self.pool, id, fields).await
    }

    async fn append_option(&self, id: Uuid, option: &str) -> Result<GuardedUpdate> {
        sessions::append_option(&self.pool, id, option).await
    }

    async fn finish_session(&self, id: Uuid) -> Result<GuardedUpdate> {
        sessions::finish_session(&self.pool, id).await
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<Place> {
        places::insert_place(&self.pool, place).await
    }

    async fn find_places(&self, filter: &PlaceFilter, limit: i64) -> Result<Vec<Place>> {
        places::find_places(&self.pool, filter, limit).await
    }

    async fn list_places(&self, kind: Option<PlaceKind>, limit: i64) -> Result<Vec<Place>> {
        places::list_places(&self.pool, kind, limit).await
    }

    async fn insert_planner(&self, planner: &NewPlanner) -> Result<Planner> {
        planners::insert_planner(&self.pool, planner).await
    }

    async fn latest_planner_for_session(&self, session_id: Uuid) -> Result<Option<Planner>> {
        planners::get_latest_planner_for_session(&self.pool, session_id).await
    }
}
