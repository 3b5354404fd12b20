//! Records exchanged with the generation capability.
//!
//! Each top-level record implements [`GenerationSchema`]; its JSON Schema is
//! derived with `schemars` and shown to the model as format instructions.
//! Field doc comments end up in that schema as descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::GenerationSchema;

/// Upper bound on `primary_traits` kept on a session.
pub const MAX_PRIMARY_TRAITS: usize = 8;

// ---------------------------------------------------------------------------
// Trait extraction
// ---------------------------------------------------------------------------

/// A named group of related tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryGroup {
    /// Group name, e.g. "자연" or "음식".
    pub category: String,
    /// Tags belonging to the group.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Travel traits extracted from a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlaceFeatures {
    /// The destination as given by the user.
    pub place: String,
    /// Most characteristic keywords, most important first (at most 8).
    pub primary_traits: Vec<String>,
    /// Tags grouped by category.
    #[serde(default)]
    pub categories: Vec<CategoryGroup>,
    /// One sentence describing the destination.
    #[serde(default)]
    pub short_description: String,
}

impl GenerationSchema for PlaceFeatures {
    const NAME: &'static str = "place_features";

    fn validate(&self) -> Result<(), String> {
        if self.primary_traits.iter().all(|t| t.trim().is_empty()) {
            return Err("primary_traits must contain at least one keyword".into());
        }
        Ok(())
    }
}

impl PlaceFeatures {
    /// Pin `place` to the caller's input and enforce the trait cap.
    pub fn normalize(mut self, place: &str) -> Self {
        self.place = place.to_owned();
        self.primary_traits.retain(|t| !t.trim().is_empty());
        self.primary_traits.truncate(MAX_PRIMARY_TRAITS);
        self
    }
}

/// Read-only view over a session's stored `categories` mapping.
///
/// Stored categories are loosely typed JSON; missing or ill-typed entries
/// are skipped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTraits {
    pub place: String,
    pub primary_traits: Vec<String>,
    pub groups: Vec<CategoryGroup>,
}

impl SessionTraits {
    pub fn from_categories(categories: &Value) -> Self {
        let place = categories
            .get("place")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_owned();

        let primary_traits = string_list(categories.get("primary_traits"));

        let groups = categories
            .get("categories")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|group| {
                        let category = group.get("category")?.as_str()?.trim();
                        let tags = string_list(group.get("tags"));
                        (!category.is_empty() && !tags.is_empty()).then(|| CategoryGroup {
                            category: category.to_owned(),
                            tags,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            place,
            primary_traits,
            groups,
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// One place the model picked from the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationDraft {
    /// Place name, copied exactly from the candidate list.
    pub name: String,
    /// Address, copied from the candidate list.
    #[serde(default)]
    pub address: String,
    /// Why the place fits, in one sentence.
    pub reason: String,
    /// Fit score from 1 to 10.
    #[serde(default)]
    pub match_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationDrafts {
    /// Recommended places, best first.
    pub places: Vec<RecommendationDraft>,
}

impl GenerationSchema for RecommendationDrafts {
    const NAME: &'static str = "place_recommendations";
}

/// A recommendation returned to callers. Coordinates come from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub address: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<RecommendationDraft> for Recommendation {
    fn from(draft: RecommendationDraft) -> Self {
        Self {
            name: draft.name,
            address: draft.address,
            reason: draft.reason,
            match_score: draft.match_score,
            latitude: None,
            longitude: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Travel plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MainDestination {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Why this destination anchors the trip.
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Place,
    Restaurant,
    Accommodation,
}

/// One time-ordered entry in a day's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleItem {
    pub kind: ScheduleKind,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Time label, e.g. "09:00".
    pub time: String,
    #[serde(default)]
    pub reason: String,
    /// Restaurants only, e.g. "한식".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    /// Restaurants only, e.g. "점심".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_time: Option<String>,
    /// Accommodation only, e.g. "호텔".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// Day index, starting at 1.
    pub day: u32,
    /// Date label, e.g. "1일차" or "2024-03-15".
    #[serde(default)]
    pub date: String,
    pub schedule: Vec<ScheduleItem>,
    /// One sentence summarizing the day.
    #[serde(default)]
    pub summary: String,
}

/// A complete multi-day itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TravelPlan {
    pub main_destination: MainDestination,
    pub total_days: u32,
    pub daily_plans: Vec<DayPlan>,
    /// Trip overview and tips.
    #[serde(default)]
    pub overview: String,
}

impl GenerationSchema for TravelPlan {
    const NAME: &'static str = "travel_plan";

    fn validate(&self) -> Result<(), String> {
        if self.main_destination.name.trim().is_empty() {
            return Err("main_destination.name must not be empty".into());
        }
        if self.daily_plans.is_empty() {
            return Err("daily_plans must not be empty".into());
        }
        Ok(())
    }
}
