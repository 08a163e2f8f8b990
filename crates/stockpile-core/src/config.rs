//! Project and user configuration loaded from TOML, plus output-mode resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::ActorId;

/// Directory holding the store and project config, relative to the root.
pub const STOCKPILE_DIR: &str = ".stockpile";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file; relative paths resolve against the project root.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            project_root.join(&self.path)
        }
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Cap on name search results.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Cap on holder and producer listings.
    #[serde(default = "default_holders_limit")]
    pub holders_limit: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            holders_limit: default_holders_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Actor used when `--actor` and `STOCKPILE_ACTOR` are both absent.
    #[serde(default)]
    pub actor: Option<ActorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `.stockpile/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(STOCKPILE_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/stockpile/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("stockpile/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project and user config and settle the output mode.
///
/// # Errors
///
/// Returns an error if either config file is unreadable or malformed.
pub fn resolve_config(project_root: &Path, cli_format: Option<&str>) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_format: Option<&str>,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if let Some(mode) = cli_format.and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(STOCKPILE_DIR).join("stockpile.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_search_limit() -> u32 {
    25
}

const fn default_holders_limit() -> u32 {
    10
}

const fn default_bar_width() -> usize {
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project_config(root: &Path, body: &str) {
        let dir = root.join(STOCKPILE_DIR);
        std::fs::create_dir_all(&dir).expect("create .stockpile");
        std::fs::write(dir.join("config.toml"), body).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.busy_timeout(), Duration::from_secs(5));
        assert_eq!(
            cfg.store.database_path(root.path()),
            root.path().join(".stockpile/stockpile.db")
        );
        assert_eq!(cfg.lookup.search_limit, 25);
        assert_eq!(cfg.lookup.holders_limit, 10);
        assert_eq!(cfg.dashboard.bar_width, 12);
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(
            root.path(),
            r#"
[store]
busy_timeout_ms = 250

[lookup]
holders_limit = 3
"#,
        );

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.busy_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.store.path, PathBuf::from(".stockpile/stockpile.db"));
        assert_eq!(cfg.lookup.holders_limit, 3);
        assert_eq!(cfg.lookup.search_limit, 25);
    }

    #[test]
    fn absolute_store_path_is_kept() {
        let store = StoreConfig {
            path: PathBuf::from("/var/lib/stockpile/main.db"),
            busy_timeout_ms: 1,
        };
        assert_eq!(
            store.database_path(Path::new("/home/ops")),
            PathBuf::from("/var/lib/stockpile/main.db")
        );
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[store\npath = 3");
        let err = load_project_config(root.path()).expect_err("parse must fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn user_config_parses_actor_and_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"json\"\nactor = 4242\n").expect("write config");

        let cfg = load_user_config_from(&path).expect("load should succeed");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.actor, Some(4242));

        let missing = load_user_config_from(&dir.path().join("nope.toml")).expect("defaults");
        assert!(missing.actor.is_none());
    }

    #[test]
    fn cli_format_overrides_env_and_config() {
        let output = resolve_output(
            Some("json"),
            Some("pretty".to_string()),
            Some("text".to_string()),
        )
        .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config_and_aliases_normalize() {
        let output = resolve_output(None, Some("json".to_string()), Some("plain".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "text");

        let output = resolve_output(None, Some("human".to_string()), Some("bogus".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "pretty");
    }
}
