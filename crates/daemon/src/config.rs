//! Daemon configuration.
//!
//! One TOML file listing the view templates. A missing file is written
//! out with the defaults so users have something to edit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::vfs::template::{PathTemplate, TemplateError};

const CONFIG_DIR: &str = "podfuse";
const CONFIG_FILE: &str = "config.toml";

/// Default views: flat, by artist, by album, by genre.
const DEFAULT_VIEWS: [&str; 4] = [
    "/All/%a - %t.%e",
    "/Artists/%a/%A/%T - %t.%e",
    "/Albums/%A/%T - %a - %t.%e",
    "/Genre/%g/%a/%A/%T - %t.%e",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot locate a configuration directory")]
    NoConfigDir,

    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config file is malformed: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// View templates, one projected directory hierarchy each.
    pub views: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            views: DEFAULT_VIEWS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl Config {
    /// The per-user config path, `~/.config/podfuse/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads the config, writing the default file first if none exists.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                match toml::to_string_pretty(&config) {
                    Ok(rendered) => fs::write(path, rendered)?,
                    Err(err) => tracing::warn!(error = %err, "cannot render default config"),
                }
                tracing::info!(path = %path.display(), "wrote default config");
                Ok(config)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Parses the view templates, failing fast on a bad placeholder.
    pub fn templates(&self) -> Result<Vec<PathTemplate>, ConfigError> {
        self.views
            .iter()
            .map(|v| PathTemplate::parse(v).map_err(ConfigError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_views_parse() {
        let config = Config::default();
        let templates = config.templates().unwrap();
        assert_eq!(templates.len(), 4);
        assert_eq!(templates[0].fixed_root(), Some("All"));
        assert_eq!(templates[3].fixed_root(), Some("Genre"));
    }

    #[test]
    fn test_load_writes_default_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("podfuse/config.toml");

        let first = Config::load_or_init(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(first.views.len(), 4);

        // Edits survive the next load.
        fs::write(&path, "views = [\"/Flat/%t.%e\"]\n").unwrap();
        let second = Config::load_or_init(&path).unwrap();
        assert_eq!(second.views, vec!["/Flat/%t.%e".to_owned()]);
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let config = Config {
            views: vec!["/Broken/%q".to_owned()],
        };
        assert!(matches!(
            config.templates(),
            Err(ConfigError::Template(TemplateError::UnknownPlaceholder('q', _)))
        ));
    }
}
