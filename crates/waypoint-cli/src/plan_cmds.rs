//! CLI handlers for `waypoint plan` subcommands.
//!
//! Implements:
//! - `waypoint plan create <session-id> --name ...` -- generate and store an itinerary
//! - `waypoint plan show <session-id>`              -- print the latest itinerary
//! - `waypoint plan show <session-id> --all`        -- print every itinerary, oldest first

use anyhow::{Context, Result};
use sqlx::PgPool;

use waypoint_core::planner::{MainPlace, decode_daily_plans};
use waypoint_core::schema::{DayPlan, ScheduleItem, ScheduleKind};
use waypoint_db::models::Planner;
use waypoint_db::queries::planners as planner_queries;

use crate::PlanCommands;
use crate::config::LlmConfig;
use crate::parse_id;
use crate::session_cmds::pg_service;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_plan_command(command: PlanCommands, pool: &PgPool, llm: &LlmConfig) -> Result<()> {
    match command {
        PlanCommands::Create {
            session_id,
            name,
            address,
            latitude,
            longitude,
            reason,
            json,
        } => {
            let id = parse_id(&session_id)?;
            let main_place = MainPlace {
                name,
                address,
                latitude,
                longitude,
                reason,
            };
            let planner = pg_service(pool, llm)?.create_plan(id, &main_place).await?;
            print_planner(&planner, json)
        }
        PlanCommands::Show {
            session_id,
            all: true,
            json,
        } => {
            let id = parse_id(&session_id)?;
            let planners = planner_queries::list_planners_for_session(pool, id).await?;
            if planners.is_empty() {
                anyhow::bail!("no plan found for session {id}");
            }
            for (idx, planner) in planners.iter().enumerate() {
                if idx > 0 && !json {
                    println!();
                    println!("{}", "-".repeat(40));
                }
                print_planner(planner, json)?;
            }
            Ok(())
        }
        PlanCommands::Show {
            session_id,
            all: false,
            json,
        } => {
            let id = parse_id(&session_id)?;
            let planner = planner_queries::get_latest_planner_for_session(pool, id)
                .await?
                .with_context(|| format!("no plan found for session {id}"))?;
            print_planner(&planner, json)
        }
    }
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

fn print_planner(planner: &Planner, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(planner).context("failed to serialize plan")?;
        println!("{rendered}");
        return Ok(());
    }

    let days = decode_daily_plans(planner)?;
    println!("Plan {} ({} days)", planner.id, planner.total_days);
    println!(
        "  Main destination: {} {}",
        planner.main_destination_name, planner.main_destination_address
    );
    if !planner.overview.is_empty() {
        println!("  Overview: {}", planner.overview);
    }
    for day in &days {
        println!();
        print_day(day);
    }
    Ok(())
}

fn print_day(day: &DayPlan) {
    if day.date.is_empty() {
        println!("Day {}", day.day);
    } else {
        println!("Day {} ({})", day.day, day.date);
    }
    for item in &day.schedule {
        println!("  {}", describe_item(item));
    }
    if !day.summary.is_empty() {
        println!("  => {}", day.summary);
    }
}

fn describe_item(item: &ScheduleItem) -> String {
    let detail = match item.kind {
        ScheduleKind::Place => None,
        ScheduleKind::Restaurant => match (&item.meal_time, &item.cuisine_type) {
            (Some(meal), Some(cuisine)) => Some(format!("{meal}, {cuisine}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        },
        ScheduleKind::Accommodation => item.accommodation_type.clone(),
    };
    let label = match item.kind {
        ScheduleKind::Place => "place",
        ScheduleKind::Restaurant => "meal",
        ScheduleKind::Accommodation => "stay",
    };
    match detail {
        Some(detail) => format!("{:<6} {:<6} {} ({detail})", item.time, label, item.name),
        None => format!("{:<6} {:<6} {}", item.time, label, item.name),
    }
}
