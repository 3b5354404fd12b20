//! Recommendation selector.

use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use waypoint_db::models::Place;

use crate::error::{CoreError, CoreResult};
use crate::generation::{StructuredAdapter, Variables};
use crate::retrieval::find_candidates;
use crate::schema::{Recommendation, RecommendationDrafts, SessionTraits};
use crate::session::SessionMachine;
use crate::store::Store;

pub const DEFAULT_LIMIT: usize = 10;

/// Characters of description kept per candidate line.
const DESCRIPTION_PREVIEW_CHARS: usize = 50;

const DEFAULT_PURPOSE: &str = "여행 및 관광";

/// One line per candidate: `"{n}. {name} | {address} | {description}"`.
pub fn format_candidates(places: &[Place]) -> String {
    places
        .iter()
        .enumerate()
        .map(|(idx, place)| {
            let description: String = place
                .description
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(DESCRIPTION_PREVIEW_CHARS)
                .collect();
            format!(
                "{}. {} | {} | {}",
                idx + 1,
                place.name,
                place.address.as_deref().unwrap_or_default(),
                description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Copy coordinates from the candidate with the same name. When several
/// candidates share a name, the first one wins.
pub fn attach_coordinates(recommendations: &mut [Recommendation], candidates: &[Place]) {
    let mut by_name: HashMap<&str, &Place> = HashMap::new();
    for place in candidates {
        by_name.entry(place.name.as_str()).or_insert(place);
    }

    for rec in recommendations.iter_mut() {
        match by_name.get(rec.name.as_str()) {
            Some(place) => {
                rec.latitude = place.latitude;
                rec.longitude = place.longitude;
            }
            None => {
                rec.latitude = None;
                rec.longitude = None;
            }
        }
    }
}

/// Rank catalog places for a session. The result never holds more than
/// `limit` entries, nor more entries than there were candidates.
pub async fn recommend(
    store: &dyn Store,
    adapter: &StructuredAdapter<RecommendationDrafts>,
    session_id: Uuid,
    limit: usize,
) -> CoreResult<Vec<Recommendation>> {
    if limit < 1 {
        return Err(CoreError::InvalidInput("limit must be at least 1".into()));
    }

    let session = SessionMachine::get(store, session_id).await?;
    let traits = SessionTraits::from_categories(&session.categories);
    let candidates = find_candidates(store, &traits.place).await?;

    let purpose = match session.main_purpose.trim() {
        "" => DEFAULT_PURPOSE,
        purpose => purpose,
    };
    let variables = Variables::new()
        .text("place_name", traits.place.as_str())
        .text("keywords", traits.primary_traits.join(", "))
        .text("main_purpose", purpose)
        .text("places_list", format_candidates(&candidates.places))
        .number("limit", limit as u64);

    let drafts = adapter.generate(variables).await?;

    let mut recommendations: Vec<Recommendation> = drafts
        .places
        .into_iter()
        .filter(|d| !d.name.trim().is_empty())
        .map(Recommendation::from)
        .collect();
    attach_coordinates(&mut recommendations, &candidates.places);

    let unmatched = recommendations.iter().filter(|r| r.latitude.is_none()).count();
    if unmatched > 0 {
        warn!(%session_id, unmatched, "recommended names without a catalog match");
    }

    recommendations.truncate(limit.min(candidates.places.len()));
    info!(
        %session_id,
        candidates = candidates.places.len(),
        tier = ?candidates.tier,
        returned = recommendations.len(),
        "recommendations ready"
    );
    Ok(recommendations)
}
