mod config;
mod place_cmds;
mod plan_cmds;
mod recommend_cmd;
mod serve_cmd;
mod session_cmds;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use waypoint_core::store::{MemoryStore, PgStore};
use waypoint_db::pool;

use config::WaypointConfig;

#[derive(Parser)]
#[command(name = "waypoint", about = "Conversational travel planner")]
struct Cli {
    /// Database URL (overrides WAYPOINT_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a waypoint config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/waypoint")]
        db_url: String,
        /// API key for the OpenAI-compatible generation endpoint
        #[arg(long)]
        api_key: Option<String>,
        /// Base URL of the generation endpoint
        #[arg(long)]
        base_url: Option<String>,
        /// Model name used by both generation profiles
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the waypoint database (requires config file or env vars)
    DbInit,
    /// Conversation session management
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Recommend catalog places for a session
    Recommend {
        /// Session ID
        session_id: String,
        /// Maximum number of recommendations
        #[arg(long, default_value_t = waypoint_core::recommend::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Travel plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Place catalog management
    Place {
        #[command(subcommand)]
        command: PlaceCommands,
    },
    /// Serve the JSON API over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Keep all state in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a session for a destination (extracts its traits)
    Create {
        /// Destination, e.g. "부산"
        destination: String,
    },
    /// Show one session
    Show {
        /// Session ID
        session_id: String,
    },
    /// List recent sessions, newest first
    List {
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(0..))]
        limit: i64,
    },
    /// Record the trip purpose and print the model's reply
    Purpose {
        /// Session ID
        session_id: String,
        /// Free-text purpose
        text: String,
    },
    /// Record who is travelling
    People {
        /// Session ID
        session_id: String,
        /// Free-text companions, e.g. "친구 3명"
        text: String,
    },
    /// Record the trip duration
    Day {
        /// Session ID
        session_id: String,
        /// Free-text duration, e.g. "2박3일"
        text: String,
    },
    /// Add a consideration; a negative answer closes the options stage
    #[command(name = "option")]
    AddOption {
        /// Session ID
        session_id: String,
        /// Free-text consideration, or e.g. "없어" to finish
        text: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate an itinerary around a main place
    Create {
        /// Session ID
        session_id: String,
        /// Main place name (usually one of the recommendations)
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
        /// Why this place anchors the trip
        #[arg(long, default_value = "")]
        reason: String,
        /// Print the stored plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the latest plan for a session
    Show {
        /// Session ID
        session_id: String,
        /// Show every plan for the session, oldest first
        #[arg(long)]
        all: bool,
        /// Print the stored plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PlaceCommands {
    /// Add a single place to the catalog
    Add {
        /// Place name
        name: String,
        /// Kind: attraction (관광지) or heritage (유적지)
        #[arg(long, default_value = "attraction")]
        kind: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
        #[arg(long)]
        region: Option<String>,
    },
    /// List catalog places
    List {
        /// Only places of this kind
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(i64).range(0..))]
        limit: i64,
    },
}

/// Execute the `waypoint init` command: write config file.
fn cmd_init(
    db_url: &str,
    llm: config::LlmSection,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let masked_key = llm.api_key.as_deref().map(config::mask_secret);
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        llm,
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    match masked_key {
        Some(masked) => println!("  llm.api_key = {masked}"),
        None => println!(
            "  llm.api_key not set; export {} before using generation commands",
            config::API_KEY_VAR
        ),
    }
    if let Some(ref base_url) = cfg.llm.base_url {
        println!("  llm.base_url = {base_url}");
    }
    if let Some(ref model) = cfg.llm.model {
        println!("  llm.model = {model}");
    }
    println!();
    println!("Next: run `waypoint db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `waypoint db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = WaypointConfig::resolve(cli_db_url)?;

    println!("Initializing waypoint database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("waypoint db-init complete.");
    Ok(())
}

/// Parse a session ID argument.
pub fn parse_id(raw: &str) -> anyhow::Result<uuid::Uuid> {
    use anyhow::Context;
    uuid::Uuid::parse_str(raw.trim()).with_context(|| format!("invalid session ID: {raw}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            base_url,
            model,
            force,
        } => {
            let llm = config::LlmSection {
                api_key,
                base_url,
                model,
            };
            cmd_init(&db_url, llm, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Session { command } => {
            let resolved = WaypointConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = session_cmds::run_session_command(command, &db_pool, &resolved.llm).await;
            db_pool.close().await;
            result?;
        }
        Commands::Recommend { session_id, limit } => {
            let resolved = WaypointConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                recommend_cmd::run_recommend(&db_pool, &resolved.llm, &session_id, limit).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = WaypointConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, &resolved.llm).await;
            db_pool.close().await;
            result?;
        }
        Commands::Place { command } => {
            let resolved = WaypointConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = place_cmds::run_place_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port, memory } => {
            let resolved = WaypointConfig::resolve(cli.database_url.as_deref())?;
            if memory {
                tracing::warn!("serving from an in-memory store; state is lost on exit");
                let service = resolved.llm.service(Arc::new(MemoryStore::new()))?;
                serve_cmd::run_serve(service, &bind, port).await?;
            } else {
                let db_pool = pool::create_pool(&resolved.db_config).await?;
                let result = match resolved.llm.service(Arc::new(PgStore::new(db_pool.clone()))) {
                    Ok(service) => serve_cmd::run_serve(service, &bind, port).await,
                    Err(e) => Err(e),
                };
                db_pool.close().await;
                result?;
            }
        }
    }

    Ok(())
}
