//! CLI handlers for `waypoint place` subcommands.
//!
//! Single-record catalog maintenance: `place add` and `place list`.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;

use waypoint_db::models::{Place, PlaceKind};
use waypoint_db::queries::places::{self as place_queries, NewPlace};

use crate::PlaceCommands;

pub async fn run_place_command(command: PlaceCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlaceCommands::Add {
            name,
            kind,
            address,
            description,
            latitude,
            longitude,
            region,
        } => {
            let new_place = NewPlace {
                name: name.trim().to_string(),
                kind: parse_kind(&kind)?,
                address,
                description,
                latitude,
                longitude,
                region,
            };
            cmd_add(pool, &new_place).await
        }
        PlaceCommands::List { kind, limit } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let places = place_queries::list_places(pool, kind, limit).await?;
            print_place_table(&places);
            Ok(())
        }
    }
}

fn parse_kind(raw: &str) -> Result<PlaceKind> {
    raw.trim()
        .parse::<PlaceKind>()
        .with_context(|| format!("expected attraction or heritage, got {raw:?}"))
}

async fn cmd_add(pool: &PgPool, new_place: &NewPlace) -> Result<()> {
    if new_place.name.is_empty() {
        bail!("place name must not be empty");
    }
    let place = place_queries::insert_place(pool, new_place).await?;
    println!("Place added.");
    println!("  ID:   {}", place.id);
    println!("  Name: {} ({})", place.name, place.kind);
    if place.address.as_deref().is_none_or(str::is_empty) {
        println!("  Note: places without an address are never recommended.");
    }
    Ok(())
}

fn print_place_table(places: &[Place]) {
    if places.is_empty() {
        println!("No places found.");
        return;
    }

    println!("{:<24} {:<11} {:<10} ADDRESS", "NAME", "KIND", "REGION");
    for place in places {
        println!(
            "{:<24} {:<11} {:<10} {}",
            place.name,
            place.kind.to_string(),
            place.region.as_deref().unwrap_or("-"),
            place.address.as_deref().unwrap_or("-"),
        );
    }
}
