//! Helpers shared by the core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use waypoint_core::store::{MemoryStore, Store};
use waypoint_core::{Adapters, TripService};
use waypoint_test_utils::ScriptedGenerator;
use waypoint_test_utils::fixtures;

pub struct Harness {
    pub service: TripService,
    pub store: Arc<MemoryStore>,
    pub extraction: Arc<ScriptedGenerator>,
    pub planner: Arc<ScriptedGenerator>,
}

/// A service over an empty in-memory store and two scripted generators.
pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let extraction = Arc::new(ScriptedGenerator::new("extraction"));
    let planner = Arc::new(ScriptedGenerator::new("planner"));
    let adapters = Adapters::new(extraction.clone(), planner.clone()).expect("prompts compile");
    let service = TripService::new(store.clone() as Arc<dyn Store>, adapters);
    Harness {
        service,
        store,
        extraction,
        planner,
    }
}

impl Harness {
    /// Create a session for `destination` with canned traits.
    pub async fn session(&self, destination: &str) -> waypoint_db::models::Session {
        self.extraction.push_json(fixtures::features_json());
        self.service
            .create_session(destination)
            .await
            .expect("session creation should succeed")
    }
}
