//! Database query functions for the `places` catalog.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{Place, PlaceKind};

/// Parameters for inserting a catalog place.
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub name: String,
    pub kind: PlaceKind,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
}

/// Catalog filter. Matching places always have a non-empty address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceFilter {
    pub kind: PlaceKind,
    /// Case-insensitive substring that must appear in `region` or `address`.
    pub hint: Option<String>,
}

impl PlaceFilter {
    /// Test a place against this filter in memory. Mirrors the SQL in
    /// [`find_places`].
    pub fn matches(&self, place: &Place) -> bool {
        if place.kind != self.kind {
            return false;
        }
        let address = match place.address.as_deref() {
            Some(a) if !a.is_empty() => a,
            _ => return false,
        };
        match self.hint.as_deref() {
            None => true,
            Some(hint) => {
                let hint = hint.to_lowercase();
                let in_region = place
                    .region
                    .as_deref()
                    .is_some_and(|r| r.to_lowercase().contains(&hint));
                in_region || address.to_lowercase().contains(&hint)
            }
        }
    }
}

/// Insert a place into the catalog.
pub async fn insert_place(pool: &PgPool, place: &NewPlace) -> Result<Place> {
    let row = sqlx::query_as::<_, Place>(
        "INSERT INTO places (name, kind, address, description, latitude, longitude, region) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(&place.name)
    .bind(place.kind)
    .bind(&place.address)
    .bind(&place.description)
    .bind(place.latitude)
    .bind(place.longitude)
    .bind(&place.region)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert place {:?}", place.name))?;

    Ok(row)
}

/// Find places matching `filter`, in catalog insertion order, up to `limit`.
pub async fn find_places(pool: &PgPool, filter: &PlaceFilter, limit: i64) -> Result<Vec<Place>> {
    let places = sqlx::query_as::<_, Place>(
        "SELECT * FROM places \
         WHERE kind = $1 \
           AND address IS NOT NULL AND address <> '' \
           AND ($2::text IS NULL \
                OR strpos(lower(coalesce(region, '')), lower($2)) > 0 \
                OR strpos(lower(address), lower($2)) > 0) \
         ORDER BY created_at, id \
         LIMIT $3",
    )
    .bind(filter.kind)
    .bind(&filter.hint)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to find places")?;

    Ok(places)
}

/// List catalog places, optionally restricted to one kind.
pub async fn list_places(pool: &PgPool, kind: Option<PlaceKind>, limit: i64) -> Result<Vec<Place>> {
    let places = sqlx::query_as::<_, Place>(
        "SELECT * FROM places \
         WHERE ($1::text IS NULL OR kind = $1) \
         ORDER BY created_at, id \
         LIMIT $2",
    )
    .bind(kind)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list places")?;

    Ok(places)
}
