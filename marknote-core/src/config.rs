//! Workspace configuration: discovery, loading, and CLI get/set.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_NAME: &str = "marknote";
pub const CONFIG_FILE: &str = "marknote.json";
pub const DB_FILE: &str = "marknote.db";
pub const NOTES_DIR: &str = "notes";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no {CONFIG_FILE} found; run `marknote init [destination]` to set up a workspace")]
    NotInitialized,

    #[error("{path:?} is already an initialized workspace")]
    AlreadyInitialized { path: PathBuf },

    #[error("missing developer token in {path:?}; set it with `marknote config token <value>`")]
    MissingToken { path: PathBuf },

    #[error("missing service endpoint in {path:?}; set it with `marknote config endpoint <url>`")]
    MissingEndpoint { path: PathBuf },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("failed to parse {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Workspace configuration stored in `marknote.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Developer token used as the bearer credential for every call.
    #[serde(default)]
    pub token: String,

    /// Base URL of the note service API.
    #[serde(default)]
    pub endpoint: String,

    /// Code highlight theme name.
    #[serde(default = "default_highlight")]
    pub highlight: String,

    /// External command used to rasterize diagram code fences.
    #[serde(default = "default_mermaid")]
    pub mermaid: String,

    /// When set, an unpublish whose remote note is already gone still
    /// removes the local mapping record.
    #[serde(default)]
    pub force_unpublish: bool,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_highlight() -> String {
    String::from("InspiredGitHub")
}

fn default_mermaid() -> String {
    String::from("mmdc")
}

impl Config {
    /// A fresh config with placeholder credentials, as written by `init`.
    pub fn template() -> Self {
        Self {
            token: String::from("Your developer token"),
            endpoint: String::from("https://notes.example.com/api"),
            highlight: default_highlight(),
            mermaid: default_mermaid(),
            force_unpublish: false,
            config_path: None,
        }
    }

    /// Find the config file by walking up from `work_dir`.
    pub fn locate(work_dir: &Path) -> Result<PathBuf, ConfigError> {
        let start = if work_dir.is_absolute() {
            work_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| ConfigError::Io {
                    path: work_dir.to_path_buf(),
                    source,
                })?
                .join(work_dir)
        };

        for dir in crate::fsutil::normalize(&start).ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(ConfigError::NotInitialized)
    }

    /// Load and validate the workspace config reachable from `work_dir`.
    pub fn load(work_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::locate(work_dir)?;
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let mut config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        if config.token.trim().is_empty() {
            return Err(ConfigError::MissingToken { path });
        }
        if config.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint { path });
        }

        config.config_path = Some(path);
        Ok(config)
    }

    /// Write a fresh workspace at `destination`: the config file plus the
    /// notes directory. Fails if one already exists there.
    pub fn init(destination: &Path, template: Config) -> Result<PathBuf, ConfigError> {
        let config_path = destination.join(CONFIG_FILE);
        if config_path.exists() {
            return Err(ConfigError::AlreadyInitialized {
                path: destination.to_path_buf(),
            });
        }

        fs::create_dir_all(destination.join(NOTES_DIR)).map_err(|source| ConfigError::Io {
            path: destination.join(NOTES_DIR),
            source,
        })?;

        let mut config = template;
        config.config_path = Some(config_path.clone());
        config.save()?;
        Ok(config_path)
    }

    /// Persist the config back to its file, pretty-printed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self
            .config_path
            .clone()
            .ok_or(ConfigError::NotInitialized)?;

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| ConfigError::Io { path, source })
    }

    /// Read a single setting by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "token" => Some(self.token.clone()),
            "endpoint" => Some(self.endpoint.clone()),
            "highlight" => Some(self.highlight.clone()),
            "mermaid" => Some(self.mermaid.clone()),
            "forceUnpublish" => Some(self.force_unpublish.to_string()),
            _ => None,
        }
    }

    /// Set a single setting by key. Boolean keys coerce the strings
    /// `"true"` and `"false"`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "token" => self.token = value.to_string(),
            "endpoint" => self.endpoint = value.to_string(),
            "highlight" => self.highlight = value.to_string(),
            "mermaid" => self.mermaid = value.to_string(),
            "forceUnpublish" => self.force_unpublish = value.trim() == "true",
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Directory holding the config file; everything else in the
    /// workspace is resolved relative to it.
    pub fn config_dir(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."))
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.config_dir().join(NOTES_DIR)
    }

    pub fn db_path(&self) -> PathBuf {
        self.config_dir().join(DB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut template = Config::template();
        template.token = "tok-1".into();
        template.endpoint = "https://svc.test/api".into();

        let config_path = Config::init(dir.path(), template).unwrap();
        assert!(config_path.is_file());
        assert!(dir.path().join(NOTES_DIR).is_dir());

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.token, "tok-1");
        assert_eq!(config.highlight, "InspiredGitHub");
        assert_eq!(config.db_path(), dir.path().join(DB_FILE));
    }

    #[test]
    fn init_refuses_existing_workspace() {
        let dir = TempDir::new().unwrap();
        Config::init(dir.path(), Config::template()).unwrap();

        let err = Config::init(dir.path(), Config::template()).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyInitialized { .. }));
    }

    #[test]
    fn locate_walks_upward() {
        let dir = TempDir::new().unwrap();
        Config::init(dir.path(), Config::template()).unwrap();

        let nested = dir.path().join("notes/deep/er");
        fs::create_dir_all(&nested).unwrap();

        let found = Config::locate(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn missing_workspace_reports_init_hint() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotInitialized));
        assert!(err.to_string().contains("marknote init"));
    }

    #[test]
    fn empty_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"endpoint": "https://svc.test"}"#,
        )
        .unwrap();

        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken { .. }));
    }

    #[test]
    fn set_coerces_booleans() {
        let mut config = Config::template();
        config.set("forceUnpublish", "true").unwrap();
        assert!(config.force_unpublish);
        config.set("forceUnpublish", "false").unwrap();
        assert!(!config.force_unpublish);

        assert!(matches!(
            config.set("nope", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(config.get("forceUnpublish").as_deref(), Some("false"));
        assert_eq!(config.get("nope"), None);
    }
}
