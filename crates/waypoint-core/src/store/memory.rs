use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use waypoint_db::models::{Place, PlaceKind, Planner, Session};
use waypoint_db::queries::places::{NewPlace, PlaceFilter};
use waypoint_db::queries::planners::NewPlanner;
use waypoint_db::queries::sessions::{GuardedUpdate, SessionFields};

use super::Store;

/// In-process [`Store`]. Records are kept in insertion order and every
/// operation runs under one lock, so guarded updates are atomic.
///
/// Enforces the same constraints as the database schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    sessions: Vec<Session>,
    places: Vec<Place>,
    planners: Vec<Planner>,
}

impl State {
    fn session_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn guarded(&self, id: Uuid, apply: impl FnOnce(&mut Session)) -> Result<GuardedUpdate> {
        let mut state = self.lock()?;
        let Some(session) = state.session_mut(id) else {
            return Ok(GuardedUpdate::NotFound);
        };
        if session.finished {
            return Ok(GuardedUpdate::AlreadyFinished);
        }
        apply(&mut *session);
        Ok(GuardedUpdate::Applied(session.clone()))
    }
}

fn limit_to_usize(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_session(&self, categories: &serde_json::Value) -> Result<Session> {
        if categories.as_object().is_none_or(|m| m.is_empty()) {
            bail!("failed to insert session: categories must be a non-empty mapping");
        }
        let session = Session {
            id: Uuid::new_v4(),
            categories: categories.clone(),
            main_purpose: String::new(),
            people: None,
            day: None,
            options: Vec::new(),
            finished: false,
            created_at: Utc::now(),
        };
        self.lock()?.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.lock()?.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sessions(&self, limit: i64) -> Result<Vec<Session>> {
        let state = self.lock()?;
        Ok(state
            .sessions
            .iter()
            .rev()
            .take(limit_to_usize(limit))
            .cloned()
            .collect())
    }

    async fn update_session_fields(&self, id: Uuid, fields: &SessionFields) -> Result<Option<Session>> {
        let mut state = self.lock()?;
        let Some(session) = state.session_mut(id) else {
            return Ok(None);
        };
        if let Some(purpose) = &fields.main_purpose {
            session.main_purpose = purpose.clone();
        }
        if let Some(people) = &fields.people {
            session.people = Some(people.clone());
        }
        if let Some(day) = &fields.day {
            session.day = Some(day.clone());
        }
        Ok(Some(session.clone()))
    }

    async fn append_option(&self, id: Uuid, option: &str) -> Result<GuardedUpdate> {
        self.guarded(id, |session| session.options.push(option.to_owned()))
    }

    async fn finish_session(&self, id: Uuid) -> Result<GuardedUpdate> {
        self.guarded(id, |session| session.finished = true)
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<Place> {
        if place.name.trim().is_empty() {
            bail!("failed to insert place: name must not be empty");
        }
        let row = Place {
            id: Uuid::new_v4(),
            name: place.name.clone(),
            kind: place.kind,
            address: place.address.clone(),
            description: place.description.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            region: place.region.clone(),
            created_at: Utc::now(),
        };
        self.lock()?.places.push(row.clone());
        Ok(row)
    }

    async fn find_places(&self, filter: &PlaceFilter, limit: i64) -> Result<Vec<Place>> {
        let state = self.lock()?;
        Ok(state
            .places
            .iter()
            .filter(|p| filter.matches(p))
            .take(limit_to_usize(limit))
            .cloned()
            .collect())
    }

    async fn list_places(&self, kind: Option<PlaceKind>, limit: i64) -> Result<Vec<Place>> {
        let state = self.lock()?;
        Ok(state
            .places
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .take(limit_to_usize(limit))
            .cloned()
            .collect())
    }

    async fn insert_planner(&self, planner: &NewPlanner) -> Result<Planner> {
        if planner.total_days <= 0 {
            bail!("failed to insert planner: total_days must be positive");
        }
        let mut state = self.lock()?;
        if !state.sessions.iter().any(|s| s.id == planner.session_id) {
            bail!(
                "failed to insert planner: session {} does not exist",
                planner.session_id
            );
        }
        let now = Utc::now();
        let row = Planner {
            id: Uuid::new_v4(),
            session_id: planner.session_id,
            main_destination_name: planner.main_destination_name.clone(),
            main_destination_address: planner.main_destination_address.clone(),
            main_destination_latitude: planner.main_destination_latitude,
            main_destination_longitude: planner.main_destination_longitude,
            total_days: planner.total_days,
            daily_plans: planner.daily_plans.clone(),
            overview: planner.overview.clone(),
            created_at: now,
            updated_at: now,
        };
        state.planners.push(row.clone());
        Ok(row)
    }

    async fn latest_planner_for_session(&self, session_id: Uuid) -> Result<Option<Planner>> {
        let state = self.lock()?;
        Ok(state
            .planners
            .iter()
            .rev()
            .find(|p| p.session_id == session_id)
            .cloned())
    }
}
