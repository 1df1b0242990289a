use crate::classify::registry::{self, ProfileRegistry, WeightOverride};
use crate::report::Outcome;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "patch-triage.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("mixed_threshold ({mixed}) must be below test_threshold ({test})")]
    InvalidThresholds { mixed: f64, test: f64 },
    #[error("outcome priority must list passed, failed and skipped exactly once")]
    InvalidPriority,
    #[error(transparent)]
    Registry(#[from] registry::RegistryError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub outcomes: OutcomeConfig,
    #[serde(default)]
    pub reconstruct: ReconstructConfig,
}

/// [classifier] section: score cutoffs and fixed confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_test_threshold")]
    pub test_threshold: f64,
    #[serde(default = "default_mixed_threshold")]
    pub mixed_threshold: f64,
    /// Fraction of a pattern's weight earned by a context-only match.
    #[serde(default = "default_context_weight_factor")]
    pub context_weight_factor: f64,
    /// Minimum confidence for hunks promoted by a test path.
    #[serde(default = "default_test_path_floor")]
    pub test_path_floor: f64,
    #[serde(default = "default_inline_header_confidence")]
    pub inline_header_confidence: f64,
    #[serde(default = "default_inline_marker_confidence")]
    pub inline_marker_confidence: f64,
    #[serde(default = "default_inline_touch_confidence")]
    pub inline_touch_confidence: f64,
    #[serde(default = "default_inline_code_confidence")]
    pub inline_code_confidence: f64,
    #[serde(default)]
    pub weights: Vec<WeightOverride>,
}

fn default_test_threshold() -> f64 {
    0.3
}

fn default_mixed_threshold() -> f64 {
    0.1
}

fn default_context_weight_factor() -> f64 {
    0.5
}

fn default_test_path_floor() -> f64 {
    0.6
}

fn default_inline_header_confidence() -> f64 {
    0.95
}

fn default_inline_marker_confidence() -> f64 {
    0.9
}

fn default_inline_touch_confidence() -> f64 {
    0.7
}

fn default_inline_code_confidence() -> f64 {
    0.9
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            test_threshold: default_test_threshold(),
            mixed_threshold: default_mixed_threshold(),
            context_weight_factor: default_context_weight_factor(),
            test_path_floor: default_test_path_floor(),
            inline_header_confidence: default_inline_header_confidence(),
            inline_marker_confidence: default_inline_marker_confidence(),
            inline_touch_confidence: default_inline_touch_confidence(),
            inline_code_confidence: default_inline_code_confidence(),
            weights: Vec::new(),
        }
    }
}

/// [outcomes] section: how conflicting outcomes within one run resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeConfig {
    #[serde(default = "default_priority")]
    pub priority: Vec<Outcome>,
}

fn default_priority() -> Vec<Outcome> {
    vec![Outcome::Passed, Outcome::Failed, Outcome::Skipped]
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
        }
    }
}

/// [reconstruct] section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructConfig {
    /// Shift new-side line numbers to account for excluded hunks.
    #[serde(default)]
    pub rebase_line_numbers: bool,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `patch-triage.toml` from `dir` if present, otherwise defaults.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        if !(c.mixed_threshold < c.test_threshold) {
            return Err(ConfigError::InvalidThresholds {
                mixed: c.mixed_threshold,
                test: c.test_threshold,
            });
        }
        let p = &self.outcomes.priority;
        let complete = p.len() == 3
            && [Outcome::Passed, Outcome::Failed, Outcome::Skipped]
                .iter()
                .all(|o| p.contains(o));
        if !complete {
            return Err(ConfigError::InvalidPriority);
        }
        Ok(())
    }

    /// Build the pattern registry with this config's weight overrides.
    pub fn registry(&self) -> Result<ProfileRegistry> {
        Ok(ProfileRegistry::with_overrides(&self.classifier.weights)?)
    }
}
