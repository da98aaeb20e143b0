//! Relay configuration, stored as TOML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::upload::MAX_UPLOAD_BYTES;

/// How the external predictor is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Interpreter or executable to spawn.
    pub program: String,
    /// Script passed as the first argument; the upload path follows it.
    pub script: PathBuf,
    /// Extra environment for the child process.
    pub env: BTreeMap<String, String>,
    /// Kill the predictor after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("TF_ENABLE_ONEDNN_OPTS".to_string(), "0".to_string());
        Self {
            program: "python".to_string(),
            script: PathBuf::from("./scripts/predict_emotion.py"),
            env,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// File this config was loaded from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Port the backend listens on; used to build the default backend URL.
    pub port: u16,

    /// Directory that holds uploads while the predictor runs.
    pub upload_dir: PathBuf,

    pub max_upload_bytes: u64,

    pub predictor: PredictorConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            predictor: PredictorConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load from an explicit TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("reading {}: {e}", path.display())))?;
        let mut config = Self::from_toml(&contents)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load from the platform config directory, or fall back to defaults
    /// when no file exists there.
    pub fn load_or_default() -> Result<Self, RelayError> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, RelayError> {
        toml::from_str(contents).map_err(|e| RelayError::Config(format!("parsing TOML: {e}")))
    }

    pub fn to_toml(&self) -> Result<String, RelayError> {
        toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("serializing TOML: {e}")))
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RelayError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// `<config dir>/emotion-recognizer/relay.toml` on this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "emotion-recognizer")
            .map(|dirs| dirs.config_dir().join("relay.toml"))
    }

    /// `http://localhost:<port>`
    pub fn backend_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}
