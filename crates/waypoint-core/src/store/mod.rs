//! Persistence seam for sessions, the place catalog and plans.
//!
//! [`PgStore`] delegates to the `waypoint-db` query modules. [`MemoryStore`]
//! keeps everything in process and backs tests and offline serving.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use waypoint_db::models::{Place, PlaceKind, Planner, Session};
use waypoint_db::queries::places::{NewPlace, PlaceFilter};
use waypoint_db::queries::planners::NewPlanner;
use waypoint_db::queries::sessions::{GuardedUpdate, SessionFields};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Single-record reads and writes used by the core.
///
/// Every write is one atomic operation on one record. Guarded updates
/// report whether the session was open, finished or absent.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_session(&self, categories: &serde_json::Value) -> Result<Session>;

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>>;

    /// Newest first.
    async fn list_sessions(&self, limit: i64) -> Result<Vec<Session>>;

    /// Overwrite the `Some` fields. `None` if the session does not exist.
    async fn update_session_fields(&self, id: Uuid, fields: &SessionFields) -> Result<Option<Session>>;

    /// Append to `options` only if the session is not finished.
    async fn append_option(&self, id: Uuid, option: &str) -> Result<GuardedUpdate>;

    /// Set `finished` only if it is not already set.
    async fn finish_session(&self, id: Uuid) -> Result<GuardedUpdate>;

    async fn insert_place(&self, place: &NewPlace) -> Result<Place>;

    /// Matching places in catalog insertion order, up to `limit`.
    async fn find_places(&self, filter: &PlaceFilter, limit: i64) -> Result<Vec<Place>>;

    async fn list_places(&self, kind: Option<PlaceKind>, limit: i64) -> Result<Vec<Place>>;

    async fn insert_planner(&self, planner: &NewPlanner) -> Result<Planner>;

    /// Most recently created plan for the session.
    async fn latest_planner_for_session(&self, session_id: Uuid) -> Result<Option<Planner>>;
}

// Compile-time assertion: Store must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Store) {}
};
