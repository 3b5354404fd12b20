//! CLI handlers for `waypoint session` subcommands.
//!
//! Implements:
//! - `waypoint session create <destination>`  -- extract traits and open a session
//! - `waypoint session show <id>`             -- print one session
//! - `waypoint session list`                  -- list recent sessions
//! - `waypoint session purpose|people|day <id> <text>`
//! - `waypoint session option <id> <text>`    -- append, or finish on a negative answer

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use waypoint_core::TripService;
use waypoint_core::schema::SessionTraits;
use waypoint_core::session::{OptionOutcome, SessionStage};
use waypoint_core::store::PgStore;
use waypoint_db::models::Session;
use waypoint_db::queries::sessions as session_queries;

use crate::SessionCommands;
use crate::config::LlmConfig;
use crate::parse_id;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_session_command(command: SessionCommands, pool: &PgPool, llm: &LlmConfig) -> Result<()> {
    match command {
        SessionCommands::Create { destination } => {
            let service = pg_service(pool, llm)?;
            let session = service.create_session(&destination).await?;
            println!("Session created.");
            println!();
            print_session(&session);
        }
        SessionCommands::Show { session_id } => {
            let id = parse_id(&session_id)?;
            let session = session_queries::get_session(pool, id)
                .await?
                .with_context(|| format!("session {id} not found"))?;
            print_session(&session);
        }
        SessionCommands::List { limit } => {
            let sessions = session_queries::list_sessions(pool, limit).await?;
            print_session_table(&sessions);
        }
        SessionCommands::Purpose { session_id, text } => {
            let id = parse_id(&session_id)?;
            let reply = pg_service(pool, llm)?.set_purpose(id, &text).await?;
            println!("{reply}");
        }
        SessionCommands::People { session_id, text } => {
            let id = parse_id(&session_id)?;
            let session = pg_service(pool, llm)?.set_people(id, &text).await?;
            println!("People set to {:?}.", session.people.unwrap_or_default());
        }
        SessionCommands::Day { session_id, text } => {
            let id = parse_id(&session_id)?;
            let session = pg_service(pool, llm)?.set_day(id, &text).await?;
            println!("Duration set to {:?}.", session.day.unwrap_or_default());
        }
        SessionCommands::AddOption { session_id, text } => {
            let id = parse_id(&session_id)?;
            match pg_service(pool, llm)?.add_option(id, &text).await? {
                OptionOutcome::Appended(session) => {
                    println!("Option recorded ({} total).", session.options.len());
                }
                OptionOutcome::Finished(session) => {
                    println!(
                        "Options closed with {} consideration(s). Next: `waypoint recommend {id}`",
                        session.options.len()
                    );
                }
            }
        }
    }
    Ok(())
}

/// Build a service over the PostgreSQL store.
pub fn pg_service(pool: &PgPool, llm: &LlmConfig) -> Result<TripService> {
    llm.service(Arc::new(PgStore::new(pool.clone())))
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

fn print_session(session: &Session) {
    let traits = SessionTraits::from_categories(&session.categories);

    println!("  Session ID:  {}", session.id);
    println!("  Stage:       {}", SessionStage::of(session));
    println!("  Destination: {}", traits.place);
    if !traits.primary_traits.is_empty() {
        println!("  Traits:      {}", traits.primary_traits.join(", "));
    }
    for group in &traits.groups {
        println!("    {}: {}", group.category, group.tags.join(", "));
    }
    if !session.main_purpose.is_empty() {
        println!("  Purpose:     {}", session.main_purpose);
    }
    if let Some(ref people) = session.people {
        println!("  People:      {people}");
    }
    if let Some(ref day) = session.day {
        println!("  Duration:    {day}");
    }
    if !session.options.is_empty() {
        println!("  Options:");
        for option in &session.options {
            println!("    - {option}");
        }
    }
    println!("  Created:     {}", session.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn print_session_table(sessions: &[Session]) {
    if sessions.is_empty() {
        println!("No sessions found.");
        return;
    }

    println!("{:<38} {:<16} {:<12} CREATED", "ID", "DESTINATION", "STAGE");
    for session in sessions {
        let traits = SessionTraits::from_categories(&session.categories);
        println!(
            "{:<38} {:<16} {:<12} {}",
            session.id,
            traits.place,
            SessionStage::of(session).to_string(),
            session.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
}
