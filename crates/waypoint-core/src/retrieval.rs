//! Candidate retrieval from the place catalog.
//!
//! Two tiers: attractions with an address whose region or address contains
//! the hint, then, if that finds nothing, any attraction with an address.

use tracing::{debug, info};

use waypoint_db::models::{Place, PlaceKind};
use waypoint_db::queries::places::PlaceFilter;

use crate::error::{CoreError, CoreResult};
use crate::store::Store;

/// Maximum number of candidates shown to the recommendation model.
pub const CANDIDATE_LIMIT: i64 = 30;

/// Which tier produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTier {
    Hinted,
    Widened,
}

#[derive(Debug, Clone)]
pub struct Candidates {
    pub places: Vec<Place>,
    pub tier: RetrievalTier,
}

fn eligible(places: Vec<Place>) -> Vec<Place> {
    places
        .into_iter()
        .filter(|p| !p.name.trim().is_empty())
        .collect()
}

/// Retrieve up to [`CANDIDATE_LIMIT`] candidates for `hint`.
///
/// Fails with [`CoreError::NoCandidates`] only if both tiers are empty.
pub async fn find_candidates(store: &dyn Store, hint: &str) -> CoreResult<Candidates> {
    let hint = hint.trim();

    if !hint.is_empty() {
        let filter = PlaceFilter {
            kind: PlaceKind::Attraction,
            hint: Some(hint.to_owned()),
        };
        let places = eligible(store.find_places(&filter, CANDIDATE_LIMIT).await?);
        if !places.is_empty() {
            debug!(hint, candidates = places.len(), "hinted retrieval");
            return Ok(Candidates {
                places,
                tier: RetrievalTier::Hinted,
            });
        }
        info!(hint, "no candidates match hint, widening to the full catalog");
    }

    let filter = PlaceFilter {
        kind: PlaceKind::Attraction,
        hint: None,
    };
    let places = eligible(store.find_places(&filter, CANDIDATE_LIMIT).await?);
    if places.is_empty() {
        return Err(CoreError::NoCandidates);
    }
    debug!(candidates = places.len(), "widened retrieval");
    Ok(Candidates {
        places,
        tier: RetrievalTier::Widened,
    })
}
