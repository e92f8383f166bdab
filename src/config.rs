use crate::analyzer::{Window, YearScope};
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".routine";
const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_API_PORT: u16 = 7891;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub default_window: Window,
    pub match_year: bool,
    pub api_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_window: Window::Week,
            match_year: false,
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        default_root_dir().join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    pub fn year_scope(&self) -> YearScope {
        YearScope::from_flag(self.match_year)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                if value.trim().is_empty() {
                    bail!("db_path must not be empty");
                }
                self.db_path = expand_home(value.trim());
            }
            "default_window" => {
                self.default_window = value.parse::<Window>()?;
            }
            "match_year" => {
                self.match_year = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| anyhow!("match_year must be true/false"))?;
            }
            "api_port" => {
                self.api_port = value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, default_window|insights.window, match_year|insights.match_year, api_port|api.port"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "default_window" => Some(self.default_window.to_string()),
            "match_year" => Some(self.match_year.to_string()),
            "api_port" => Some(self.api_port.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "default_window" | "insights.window" => "default_window",
        "match_year" | "insights.match_year" => "match_year",
        "api_port" | "api.port" => "api_port",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

pub fn default_db_path() -> PathBuf {
    default_root_dir().join("db").join("activities.db")
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
