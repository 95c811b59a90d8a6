//! Persisted player preferences. Session state itself is never stored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyLevel;

/// Missing keys take their default, so older files keep loading
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: DifficultyLevel,
    /// Fixed seed for both random streams; `None` draws from entropy
    pub seed: Option<u64>,
    pub muted: bool,
}

pub trait ConfigStore {
    /// Never fails: anything unreadable yields `Config::default()`
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

/// JSON file under the platform config dir
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self::with_path(AppDirs::config_path())
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Config::default(),
        };
        serde_json::from_str(&text).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "ignoring unreadable config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(cfg).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}
