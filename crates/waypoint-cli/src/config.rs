//! Configuration file management for waypoint.
//!
//! Provides a TOML-based config file at `~/.config/waypoint/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use waypoint_core::generation::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use waypoint_core::generation::{GenerationProfile, Generator, OpenAiGenerator};
use waypoint_core::store::Store;
use waypoint_core::{Adapters, TripService};
use waypoint_db::config::DbConfig;

pub const API_KEY_VAR: &str = "WAYPOINT_LLM_API_KEY";
pub const FALLBACK_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "WAYPOINT_LLM_BASE_URL";
pub const MODEL_VAR: &str = "WAYPOINT_LLM_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the waypoint config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/waypoint` or `~/.config/waypoint`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("waypoint");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("waypoint")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file holds an API key, so it is written with mode 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Mask all but the first and last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Settings for the generation backend.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl LlmConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!(
                "LLM API key not found; set {API_KEY_VAR} (or {FALLBACK_API_KEY_VAR}) or run `waypoint init --api-key ...`"
            ),
        }
    }

    /// Build the extraction and planner generators, one per profile.
    pub fn generators(&self) -> Result<(Arc<dyn Generator>, Arc<dyn Generator>)> {
        let api_key = self.require_api_key()?;
        let extraction = OpenAiGenerator::new(
            &self.base_url,
            api_key,
            GenerationProfile::extraction(&self.model),
        )
        .context("failed to build extraction generator")?;
        let planner = OpenAiGenerator::new(
            &self.base_url,
            api_key,
            GenerationProfile::planner(&self.model),
        )
        .context("failed to build planner generator")?;
        Ok((Arc::new(extraction), Arc::new(planner)))
    }

    /// Wire a [`TripService`] over `store` with generators from this config.
    pub fn service(&self, store: Arc<dyn Store>) -> Result<TripService> {
        let (extraction, planner) = self.generators()?;
        let adapters = Adapters::new(extraction, planner).context("failed to compile prompts")?;
        Ok(TripService::new(store, adapters))
    }
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WaypointConfig {
    pub db_config: DbConfig,
    pub llm: LlmConfig,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl WaypointConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `WAYPOINT_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `WAYPOINT_LLM_API_KEY` > `OPENAI_API_KEY` > `llm.api_key` > none
    /// - Base URL and model: env > `llm.*` > OpenAI defaults
    ///
    /// A missing API key is only an error for commands that call the model.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        let llm_file = file_config.as_ref().map(|cfg| &cfg.llm);

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Some(url) = env_non_empty(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let api_key = env_non_empty(API_KEY_VAR)
            .or_else(|| env_non_empty(FALLBACK_API_KEY_VAR))
            .or_else(|| llm_file.and_then(|llm| llm.api_key.clone()));
        let base_url = env_non_empty(BASE_URL_VAR)
            .or_else(|| llm_file.and_then(|llm| llm.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env_non_empty(MODEL_VAR)
            .or_else(|| llm_file.and_then(|llm| llm.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            db_config: DbConfig::new(db_url),
            llm: LlmConfig {
                api_key,
                base_url,
                model,
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_util::{EnvGuard, lock_env};

    const VARS: &[&str] = &[
        DbConfig::ENV_VAR,
        API_KEY_VAR,
        FALLBACK_API_KEY_VAR,
        BASE_URL_VAR,
        MODEL_VAR,
        "XDG_CONFIG_HOME",
    ];

    #[test]
    fn config_file_roundtrip_omits_missing_llm_fields() {
        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/trips".to_string(),
            },
            llm: LlmSection {
                api_key: Some("sk-test".to_string()),
                base_url: None,
                model: None,
            },
        };

        let contents = toml::to_string_pretty(&original).unwrap();
        assert!(!contents.contains("base_url"));

        let loaded: ConfigFile = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.llm.api_key.as_deref(), Some("sk-test"));
        assert!(loaded.llm.model.is_none());
    }

    #[test]
    fn llm_section_is_optional() {
        let loaded: ConfigFile =
            toml::from_str("[database]\nurl = \"postgresql://localhost/waypoint\"\n").unwrap();
        assert!(loaded.llm.api_key.is_none());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());
        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };

        let config = WaypointConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_vars() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());
        unsafe {
            std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb");
            std::env::set_var(API_KEY_VAR, "sk-waypoint");
            std::env::set_var(FALLBACK_API_KEY_VAR, "sk-openai");
            std::env::set_var(BASE_URL_VAR, "http://localhost:11434/v1");
            std::env::set_var(MODEL_VAR, "llama3");
        }

        let config = WaypointConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-waypoint"));
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "llama3");
    }

    #[test]
    fn openai_key_is_a_fallback() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());
        unsafe { std::env::set_var(FALLBACK_API_KEY_VAR, "sk-openai") };

        let config = WaypointConfig::resolve(None).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());

        let config = WaypointConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert!(config.llm.api_key.is_none());

        let err = config.llm.require_api_key().unwrap_err().to_string();
        assert!(err.contains("LLM API key not found"), "unexpected error: {err}");
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());

        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            llm: LlmSection {
                api_key: Some("sk-file".to_string()),
                base_url: None,
                model: Some("gpt-4o".to_string()),
            },
        })
        .unwrap();
        unsafe { std::env::set_var(MODEL_VAR, "env-model") };

        let config = WaypointConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.model, "env-model");
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::isolate(VARS, tmp.path());

        save_config(&ConfigFile {
            database: DatabaseSection {
                url: DbConfig::DEFAULT_URL.to_string(),
            },
            llm: LlmSection::default(),
        })
        .unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn generators_require_api_key() {
        let llm = LlmConfig {
            api_key: Some("  ".to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        };
        assert!(llm.generators().is_err());

        let llm = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..llm
        };
        let (extraction, planner) = llm.generators().unwrap();
        assert_eq!(extraction.profile(), "extraction");
        assert_eq!(planner.profile(), "planner");
    }

    #[test]
    fn debug_masks_api_key() {
        let llm = LlmConfig {
            api_key: Some("sk-abcdefghijklmnop".to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        };
        let debug = format!("{llm:?}");
        assert!(!debug.contains("abcdefghijklmnop"));
        assert!(debug.contains("sk-a...mnop"));
    }

    #[test]
    fn mask_short_secret() {
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("waypoint/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
