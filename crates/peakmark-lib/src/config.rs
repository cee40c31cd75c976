use crate::error::ConfigError;
use crate::window::WindowIndexer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where the window index goes when a subject is (re)loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadNavigation {
    /// Always start at window 0.
    #[default]
    Reset,
    /// Step one window forward from wherever the previous subject was left.
    Advance,
}

/// Annotator settings, usually read from a TOML file.
///
/// ```toml
/// fs = 125.0
/// window_seconds = 10.0
/// num_windows = 180
/// labels = ["clean", "noisy", "motion"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Sampling rate used for window arithmetic (Hz)
    pub fs: f64,
    pub window_seconds: f64,
    pub num_windows: usize,
    /// Allowed window labels; empty accepts any label
    pub labels: Vec<String>,
    pub default_label: String,
    /// Samples either side of a click that a removal reaches
    pub remove_tolerance: usize,
    pub on_load: LoadNavigation,
    /// Upper bound on window slices cached per subject
    pub cache_windows: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            fs: 125.0,
            window_seconds: 10.0,
            num_windows: 180,
            labels: vec!["clean".into(), "noisy".into(), "motion".into()],
            default_label: "clean".into(),
            remove_tolerance: 1,
            on_load: LoadNavigation::Reset,
            cache_windows: 64,
        }
    }
}

impl AnnotatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AnnotatorConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fs.is_finite() && self.fs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fs must be positive, got {}",
                self.fs
            )));
        }
        let samples = self.window_seconds * self.fs;
        if samples.is_nan() || samples < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "a {} s window holds no samples at {} Hz",
                self.window_seconds, self.fs
            )));
        }
        if self.num_windows == 0 {
            return Err(ConfigError::Invalid("num_windows must be at least 1".into()));
        }
        if self.cache_windows == 0 {
            return Err(ConfigError::Invalid(
                "cache_windows must be at least 1".into(),
            ));
        }
        if !self.default_label.is_empty() && !self.accepts_label(&self.default_label) {
            return Err(ConfigError::Invalid(format!(
                "default label '{}' is not one of {:?}",
                self.default_label, self.labels
            )));
        }
        Ok(())
    }

    pub fn window_samples(&self) -> usize {
        self.indexer().window_samples()
    }

    pub fn indexer(&self) -> WindowIndexer {
        WindowIndexer::from_seconds(self.fs, self.window_seconds, self.num_windows)
    }

    pub fn accepts_label(&self, label: &str) -> bool {
        self.labels.is_empty() || self.labels.iter().any(|l| l == label)
    }
}
