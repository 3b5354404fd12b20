//! Test support for the waypoint crates.
//!
//! - [`create_test_db`] hands each database test a freshly migrated database
//!   on one PostgreSQL server per test binary. The server is the one named by
//!   `WAYPOINT_TEST_PG_URL`, or a testcontainers instance started on first use.
//! - [`ScriptedGenerator`] replays queued model outputs.
//! - [`fixtures`] builds catalog places and canned generation payloads.

pub mod fixtures;
pub mod generator;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use waypoint_db::pool;

pub use generator::ScriptedGenerator;

/// Environment variable naming an already-running PostgreSQL server.
pub const TEST_PG_URL_VAR: &str = "WAYPOINT_TEST_PG_URL";

const POSTGRES_TAG: &str = "18";

enum Server {
    External(String),
    Container {
        url: String,
        _handle: ContainerAsync<Postgres>,
    },
}

impl Server {
    fn url(&self) -> &str {
        match self {
            Self::External(url) | Self::Container { url, .. } => url,
        }
    }
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(url) = std::env::var(TEST_PG_URL_VAR) {
        return Server::External(url.trim_end_matches('/').to_owned());
    }

    let handle = Postgres::default()
        .with_tag(POSTGRES_TAG)
        .start()
        .await
        .expect("postgres container should start");
    let host = handle.get_host().await.expect("container host");
    let port = handle
        .get_host_port_ipv4(5432)
        .await
        .expect("container port 5432 mapping");

    Server::Container {
        url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _handle: handle,
    }
}

/// Server URL for the test binary, with no database path.
pub async fn pg_url() -> &'static str {
    SERVER.get_or_init(start_server).await.url()
}

async fn connect(database: &str, max_connections: u32) -> PgPool {
    let url = format!("{}/{database}", pg_url().await);
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("cannot connect to test database {database}: {e}"))
}

/// A uniquely named, migrated database and a pool on it. Pass the returned
/// name to [`drop_test_db`] at the end of the test.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("waypoint_test_{}", Uuid::new_v4().simple());

    let admin = connect("postgres", 1).await;
    admin
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("CREATE DATABASE {db_name} failed: {e}"));
    admin.close().await;

    let db_pool = connect(&db_name, 5).await;
    pool::run_migrations(&db_pool)
        .await
        .expect("waypoint migrations apply to an empty database");

    (db_pool, db_name)
}

/// Disconnect every session on `db_name` and drop it. Errors are ignored.
pub async fn drop_test_db(db_name: &str) {
    let admin = connect("postgres", 1).await;
    let _ = sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(db_name)
    .execute(&admin)
    .await;
    let _ = admin
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    admin.close().await;
}
