/// Connection settings for the waypoint database.
///
/// The CLI resolves the URL (flag, `WAYPOINT_DATABASE_URL`, config file,
/// then [`DbConfig::DEFAULT_URL`]) and hands it over through [`DbConfig::new`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/waypoint";

    pub const ENV_VAR: &str = "WAYPOINT_DATABASE_URL";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Split `scheme://host:port/name?query` into server prefix, database
    /// name and query suffix (including its `?`).
    fn parts(&self) -> Option<(&str, &str, &str)> {
        let url = self.database_url.as_str();
        let query_at = url.find('?').unwrap_or(url.len());
        let (path, query) = url.split_at(query_at);
        let authority_at = path.find("://").map_or(0, |i| i + 3);
        let slash = authority_at + path[authority_at..].find('/')?;
        Some((&path[..slash], &path[slash + 1..], query))
    }

    /// The database named by the URL, or `None` when the path is empty.
    pub fn database_name(&self) -> Option<&str> {
        self.parts()
            .map(|(_, name, _)| name)
            .filter(|name| !name.is_empty())
    }

    /// Same server and query parameters, but the `postgres` database.
    /// `CREATE DATABASE` for the target is issued from there.
    pub fn maintenance_url(&self) -> String {
        match self.parts() {
            Some((server, _, query)) => format!("{server}/postgres{query}"),
            None => format!("{}/postgres", self.database_url.trim_end_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_names_waypoint() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_name(), Some("waypoint"));
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");
    }

    #[test]
    fn query_string_is_not_part_of_the_name() {
        let cfg = DbConfig::new("postgresql://db.internal:5432/trips?sslmode=require");
        assert_eq!(cfg.database_name(), Some("trips"));
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://db.internal:5432/postgres?sslmode=require"
        );
    }

    #[test]
    fn socket_url_without_host() {
        let cfg = DbConfig::new("postgres:///waypoint_dev");
        assert_eq!(cfg.database_name(), Some("waypoint_dev"));
        assert_eq!(cfg.maintenance_url(), "postgres:///postgres");
    }

    #[test]
    fn empty_path_has_no_name() {
        assert_eq!(DbConfig::new("postgresql://localhost:5432/").database_name(), None);
        assert_eq!(DbConfig::new("postgresql://localhost:5432").database_name(), None);
        assert_eq!(
            DbConfig::new("postgresql://localhost:5432").maintenance_url(),
            "postgresql://localhost:5432/postgres"
        );
    }
}
