use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Catalog classification of a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    /// Tourist attraction (관광지). The only kind eligible for recommendation.
    Attraction,
    /// Heritage or historic site (유적지).
    Heritage,
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Attraction => "attraction",
            Self::Heritage => "heritage",
        };
        f.write_str(s)
    }
}

impl FromStr for PlaceKind {
    type Err = PlaceKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attraction" | "관광지" => Ok(Self::Attraction),
            "heritage" | "유적지" => Ok(Self::Heritage),
            other => Err(PlaceKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlaceKind`] string.
#[derive(Debug, Clone)]
pub struct PlaceKindParseError(pub String);

impl fmt::Display for PlaceKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid place kind: {:?}", self.0)
    }
}

impl std::error::Error for PlaceKindParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A conversation session accumulating one user's travel preferences.
///
/// `categories` holds the traits extracted at creation time as a JSON
/// mapping (`place`, `primary_traits`, `categories`, `short_description`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub categories: serde_json::Value,
    pub main_purpose: String,
    pub people: Option<String>,
    pub day: Option<String>,
    pub options: Vec<String>,
    pub finished: bool,
    pub created_at: DateTime<Utc>,
}

/// A catalog place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    pub kind: PlaceKind,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A generated multi-day itinerary for a session.
///
/// `updated_at` is written at creation and not advanced afterwards; no
/// in-place edit path exists yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Planner {
    pub id: Uuid,
    pub session_id: Uuid,
    pub main_destination_name: String,
    pub main_destination_address: String,
    pub main_destination_latitude: Option<f64>,
    pub main_destination_longitude: Option<f64>,
    pub total_days: i32,
    pub daily_plans: serde_json::Value,
    pub overview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_kind_display_roundtrip() {
        for v in [PlaceKind::Attraction, PlaceKind::Heritage] {
            let parsed: PlaceKind = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn place_kind_accepts_catalog_labels() {
        assert_eq!("관광지".parse::<PlaceKind>().unwrap(), PlaceKind::Attraction);
        assert_eq!("유적지".parse::<PlaceKind>().unwrap(), PlaceKind::Heritage);
    }

    #[test]
    fn place_kind_invalid() {
        let err = "museum".parse::<PlaceKind>().unwrap_err();
        assert_eq!(err.to_string(), "invalid place kind: \"museum\"");
    }

    #[test]
    fn place_kind_serializes_snake_case() {
        let json = serde_json::to_string(&PlaceKind::Attraction).unwrap();
        assert_eq!(json, "\"attraction\"");
    }
}
