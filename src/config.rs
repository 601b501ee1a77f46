//! Butler configuration
//!
//! Loaded from a TOML file. A missing file is created with the defaults so
//! the user has something to edit.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::classifier::EnsembleStrategy;
use crate::error::ConfigError;
use crate::registry::RuleSpec;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum classifier confidence for a prediction to be acted on.
    pub confidence_threshold: f64,
    pub ensemble: EnsembleStrategy,
    pub classifier_enabled: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            ensemble: EnsembleStrategy::default(),
            classifier_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityConfig {
    /// Substituted for `{user}` in replies.
    pub user_name: String,
    /// Pick phrasings at random; otherwise always the first.
    pub randomize: bool,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            user_name: "sir".to_string(),
            randomize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub models_dir: PathBuf,
    pub training_data_dir: PathBuf,
    /// Relative file paths in commands resolve against this. Defaults to the
    /// home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            training_data_dir: PathBuf::from("training_data"),
            base_dir: None,
        }
    }
}

impl PathsConfig {
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButlerConfig {
    pub dispatch: DispatchConfig,
    pub personality: PersonalityConfig,
    pub paths: PathsConfig,
    /// Extra or overriding app aliases: spoken name to executable.
    pub apps: BTreeMap<String, String>,
    /// Custom rules, evaluated before the built-in table.
    pub rules: Vec<RuleSpec>,
    pub logging: LoggingConfig,
}

impl ButlerConfig {
    /// Parse `text`; `path` is only used in error messages.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        info!(path = %path.display(), "wrote default configuration");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: path.to_path_buf(),
            reason,
        };
        let text = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        fs::write(path, text).map_err(|e| write_err(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.dispatch.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "dispatch.confidence_threshold must be between 0 and 1, got {threshold}"
            )));
        }
        if let Some(spec) = self.rules.iter().find(|r| r.pattern.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "rule for intent `{}` has an empty pattern",
                spec.intent
            )));
        }
        Ok(())
    }
}

/// Install a compact fmt subscriber. `RUST_LOG` overrides `filter`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/butler.toml");

        let created = ButlerConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, ButlerConfig::default());

        let reloaded = ButlerConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded, created);
        assert_eq!(reloaded.dispatch.confidence_threshold, 0.7);
        assert_eq!(reloaded.personality.user_name, "sir");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let text = r#"
            [dispatch]
            confidence_threshold = 0.85
            ensemble = "best_confident"

            [apps]
            "music" = "spotify.exe"

            [[rules]]
            pattern = "play some tunes"
            intent = "open_spotify"
        "#;
        let config = ButlerConfig::from_toml(text, Path::new("butler.toml")).unwrap();

        assert_eq!(config.dispatch.confidence_threshold, 0.85);
        assert_eq!(config.dispatch.ensemble, EnsembleStrategy::BestConfident);
        assert!(config.dispatch.classifier_enabled);
        assert_eq!(config.apps.get("music").map(String::as_str), Some("spotify.exe"));
        assert_eq!(config.rules[0].intent, "open_spotify");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_threshold_out_of_range() {
        let text = "[dispatch]\nconfidence_threshold = 1.5\n";
        let err = ButlerConfig::from_toml(text, Path::new("butler.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ButlerConfig::from_toml("[dispatch\n", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_base_dir_override() {
        let paths = PathsConfig {
            base_dir: Some(PathBuf::from("/srv/butler")),
            ..PathsConfig::default()
        };
        assert_eq!(paths.base_dir(), PathBuf::from("/srv/butler"));
    }
}
