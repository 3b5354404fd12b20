//! Caller-facing operations.
//!
//! [`TripService`] bundles the store with the four generation adapters built
//! at startup. It is cheap to clone and safe to share across requests.

use std::sync::Arc;

use uuid::Uuid;

use waypoint_db::models::{Place, PlaceKind, Planner, Session};
use waypoint_db::queries::places::NewPlace;

use crate::error::{CoreError, CoreResult};
use crate::generation::{Generator, StructuredAdapter, TemplateError, TextAdapter};
use crate::planner::{self, MainPlace};
use crate::prompts;
use crate::recommend;
use crate::schema::{PlaceFeatures, Recommendation, RecommendationDrafts, TravelPlan};
use crate::session::{OptionOutcome, SessionMachine};
use crate::store::Store;

/// One adapter per (prompt, schema) pair.
pub struct Adapters {
    pub traits: StructuredAdapter<PlaceFeatures>,
    pub purpose: TextAdapter,
    pub recommend: StructuredAdapter<RecommendationDrafts>,
    pub planner: StructuredAdapter<TravelPlan>,
}

impl Adapters {
    /// Compile every prompt. `extraction` serves the short deterministic
    /// calls; `planner` serves itinerary generation.
    pub fn new(extraction: Arc<dyn Generator>, planner: Arc<dyn Generator>) -> Result<Self, TemplateError> {
        Ok(Self {
            traits: StructuredAdapter::new(Arc::clone(&extraction), prompts::traits()?),
            purpose: TextAdapter::new(Arc::clone(&extraction), prompts::purpose()?),
            recommend: StructuredAdapter::new(extraction, prompts::recommend()?),
            planner: StructuredAdapter::new(planner, prompts::planner()?),
        })
    }
}

#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn Store>,
    adapters: Arc<Adapters>,
}

impl TripService {
    pub fn new(store: Arc<dyn Store>, adapters: Adapters) -> Self {
        Self {
            store,
            adapters: Arc::new(adapters),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub async fn create_session(&self, destination: &str) -> CoreResult<Session> {
        SessionMachine::create(self.store(), &self.adapters.traits, destination).await
    }

    pub async fn get_session(&self, id: Uuid) -> CoreResult<Session> {
        SessionMachine::get(self.store(), id).await
    }

    pub async fn list_sessions(&self, limit: i64) -> CoreResult<Vec<Session>> {
        SessionMachine::list(self.store(), limit).await
    }

    /// Returns the advisory reply; the purpose itself is stored.
    pub async fn set_purpose(&self, id: Uuid, purpose: &str) -> CoreResult<String> {
        SessionMachine::set_purpose(self.store(), &self.adapters.purpose, id, purpose).await
    }

    pub async fn set_people(&self, id: Uuid, people: &str) -> CoreResult<Session> {
        SessionMachine::set_people(self.store(), id, people).await
    }

    pub async fn set_day(&self, id: Uuid, day: &str) -> CoreResult<Session> {
        SessionMachine::set_day(self.store(), id, day).await
    }

    pub async fn add_option(&self, id: Uuid, option: &str) -> CoreResult<OptionOutcome> {
        SessionMachine::add_option(self.store(), id, option).await
    }

    // -----------------------------------------------------------------------
    // Recommendations and plans
    // -----------------------------------------------------------------------

    pub async fn recommend(&self, session_id: Uuid, limit: usize) -> CoreResult<Vec<Recommendation>> {
        recommend::recommend(self.store(), &self.adapters.recommend, session_id, limit).await
    }

    pub async fn create_plan(&self, session_id: Uuid, main_place: &MainPlace) -> CoreResult<Planner> {
        planner::create_plan(self.store(), &self.adapters.planner, session_id, main_place).await
    }

    pub async fn get_plan(&self, session_id: Uuid) -> CoreResult<Planner> {
        planner::get_plan(self.store(), session_id).await
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub async fn add_place(&self, place: &NewPlace) -> CoreResult<Place> {
        if place.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("place name must not be empty".into()));
        }
        Ok(self.store.insert_place(place).await?)
    }

    pub async fn list_places(&self, kind: Option<PlaceKind>, limit: i64) -> CoreResult<Vec<Place>> {
        Ok(self.store.list_places(kind, limit).await?)
    }
}
