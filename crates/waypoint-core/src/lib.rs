//! Waypoint core: the staged travel-planning session and the
//! generation/retrieval pipeline behind it.
//!
//! Callers go through [`service::TripService`]; the persistence and
//! generation collaborators are injected as [`store::Store`] and
//! [`generation::Generator`] trait objects.

pub mod error;
pub mod generation;
pub mod planner;
pub mod prompts;
pub mod recommend;
pub mod retrieval;
pub mod schema;
pub mod service;
pub mod session;
pub mod store;

pub use error::{CoreError, CoreResult};
pub use service::{Adapters, TripService};
