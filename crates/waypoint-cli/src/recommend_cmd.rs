//! CLI handler for `waypoint recommend <session-id>`.

use anyhow::Result;
use sqlx::PgPool;

use waypoint_core::schema::Recommendation;

use crate::config::LlmConfig;
use crate::parse_id;
use crate::session_cmds::pg_service;

pub async fn run_recommend(pool: &PgPool, llm: &LlmConfig, session_id: &str, limit: usize) -> Result<()> {
    let id = parse_id(session_id)?;
    let recommendations = pg_service(pool, llm)?.recommend(id, limit).await?;
    print_recommendations(&recommendations);
    Ok(())
}

fn format_coordinates(rec: &Recommendation) -> String {
    match (rec.latitude, rec.longitude) {
        (Some(lat), Some(lng)) => format!("{lat:.4}, {lng:.4}"),
        _ => "-".to_string(),
    }
}

fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        println!("The model selected no places.");
        return;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        let score = rec
            .match_score
            .map(|s| format!(" [{s}/10]"))
            .unwrap_or_default();
        println!("{}. {}{score}", i + 1, rec.name);
        if !rec.address.is_empty() {
            println!("   Address:     {}", rec.address);
        }
        println!("   Coordinates: {}", format_coordinates(rec));
        if !rec.reason.is_empty() {
            println!("   Why:         {}", rec.reason);
        }
    }
}
