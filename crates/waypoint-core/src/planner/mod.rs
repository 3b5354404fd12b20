//! Plan assembler.
//!
//! Turns a session plus a chosen main destination into a persisted
//! multi-day itinerary. Sessions are only read here, never written.

pub mod days;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use waypoint_db::models::{Planner, Session};
use waypoint_db::queries::planners::NewPlanner;

use crate::error::{CoreError, CoreResult};
use crate::generation::{GenerationSchema, MalformedOutput, StructuredAdapter, Variables};
use crate::schema::{DayPlan, SessionTraits, TravelPlan};
use crate::session::SessionMachine;
use crate::store::Store;

pub use days::{DEFAULT_TRAVEL_DAYS, parse_travel_days};

const GENERAL_INTERESTS: &str = "일반 관광";
const NO_CONSIDERATIONS: &str = "특별한 고려사항 없음";
const DEFAULT_PURPOSE: &str = "여행 및 관광";
const UNKNOWN_PEOPLE: &str = "정보 없음";
const UNKNOWN_COORDINATE: &str = "unknown";

/// The destination a plan is built around, usually one of the
/// recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainPlace {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub reason: String,
}

/// Summarize the session's interests: primary traits, then one line per
/// category group.
pub fn build_categories_context(traits: &SessionTraits) -> String {
    let mut lines = Vec::new();
    if !traits.primary_traits.is_empty() {
        lines.push(format!("주요 관심사: {}", traits.primary_traits.join(", ")));
    }
    for group in &traits.groups {
        lines.push(format!("{}: {}", group.category, group.tags.join(", ")));
    }

    if lines.is_empty() {
        GENERAL_INTERESTS.to_owned()
    } else {
        lines.join("\n")
    }
}

pub fn build_considerations(options: &[String]) -> String {
    if options.is_empty() {
        NO_CONSIDERATIONS.to_owned()
    } else {
        options.join(", ")
    }
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

fn coordinate(variables: Variables, name: &str, value: Option<f64>) -> Variables {
    match value {
        Some(v) => variables.float(name, v),
        None => variables.text(name, UNKNOWN_COORDINATE),
    }
}

fn plan_variables(session: &Session, main_place: &MainPlace, travel_days: u32) -> Variables {
    let traits = SessionTraits::from_categories(&session.categories);

    let variables = Variables::new()
        .text("main_place_name", main_place.name.trim())
        .text("main_place_address", main_place.address.as_str())
        .text("main_place_reason", main_place.reason.as_str())
        .text("categories", build_categories_context(&traits))
        .text("main_purpose", or_default(Some(session.main_purpose.as_str()), DEFAULT_PURPOSE))
        .text("people", or_default(session.people.as_deref(), UNKNOWN_PEOPLE))
        .number("travel_days", travel_days)
        .text("considerations", build_considerations(&session.options));
    let variables = coordinate(variables, "main_place_latitude", main_place.latitude);
    coordinate(variables, "main_place_longitude", main_place.longitude)
}

/// Require exactly `travel_days` day records numbered 1..=travel_days.
/// Returns the records sorted by day.
fn check_day_sequence(mut daily_plans: Vec<DayPlan>, travel_days: u32) -> Result<Vec<DayPlan>, MalformedOutput> {
    let malformed = |reason: String| MalformedOutput::new(TravelPlan::NAME, reason);

    if daily_plans.len() != travel_days as usize {
        return Err(malformed(format!(
            "expected {travel_days} daily plans, got {}",
            daily_plans.len()
        )));
    }

    daily_plans.sort_by_key(|d| d.day);
    for (expected, plan) in (1..=travel_days).zip(&daily_plans) {
        if plan.day != expected {
            return Err(malformed(format!(
                "daily plans must be numbered 1..={travel_days} without gaps, found day {} at position {expected}",
                plan.day
            )));
        }
    }
    Ok(daily_plans)
}

/// Generate and persist a plan for `session_id`.
pub async fn create_plan(
    store: &dyn Store,
    adapter: &StructuredAdapter<TravelPlan>,
    session_id: Uuid,
    main_place: &MainPlace,
) -> CoreResult<Planner> {
    let session = SessionMachine::get(store, session_id).await?;
    if main_place.name.trim().is_empty() {
        return Err(CoreError::InvalidInput("main place name must not be empty".into()));
    }

    let travel_days = parse_travel_days(session.day.as_deref().unwrap_or_default());
    let total_days = i32::try_from(travel_days)
        .map_err(|_| CoreError::InvalidInput(format!("trip of {travel_days} days is too long")))?;
    let plan = adapter
        .generate(plan_variables(&session, main_place, travel_days))
        .await?;
    if plan.total_days != travel_days {
        warn!(
            %session_id,
            generated = plan.total_days,
            travel_days,
            "generated total_days differs from parsed duration, using parsed"
        );
    }
    let daily_plans = check_day_sequence(plan.daily_plans, travel_days)?;

    let daily_plans = serde_json::to_value(&daily_plans)
        .map_err(|e| CoreError::Store(anyhow::Error::new(e).context("failed to encode daily plans")))?;
    let planner = store
        .insert_planner(&NewPlanner {
            session_id,
            main_destination_name: plan.main_destination.name,
            main_destination_address: plan.main_destination.address,
            main_destination_latitude: plan.main_destination.latitude,
            main_destination_longitude: plan.main_destination.longitude,
            total_days,
            daily_plans,
            overview: plan.overview,
        })
        .await?;

    info!(%session_id, plan_id = %planner.id, total_days, "plan created");
    Ok(planner)
}

/// Latest plan for the session.
pub async fn get_plan(store: &dyn Store, session_id: Uuid) -> CoreResult<Planner> {
    store
        .latest_planner_for_session(session_id)
        .await?
        .ok_or(CoreError::PlanNotFound(session_id))
}

/// Decode a stored plan's `daily_plans` column.
pub fn decode_daily_plans(planner: &Planner) -> CoreResult<Vec<DayPlan>> {
    serde_json::from_value(planner.daily_plans.clone()).map_err(|e| {
        CoreError::Store(anyhow::Error::new(e).context(format!("plan {} has unreadable daily plans", planner.id)))
    })
}
