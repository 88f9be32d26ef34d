use crate::app_dirs::AppDirs;
use crate::corpus::{Difficulty, GenerationRequest, Language, Mode, MAX_DURATION_SECS};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persisted practice settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub language: Language,
    pub duration_secs: u32,
    pub custom_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config::from(&GenerationRequest::default())
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.duration_secs == 0 || self.duration_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "duration_secs must be between 1 and {MAX_DURATION_SECS}, got {}",
                self.duration_secs
            )));
        }
        Ok(self)
    }

    pub fn request(&self) -> GenerationRequest {
        let request = GenerationRequest::new(self.difficulty, self.mode, self.language, self.duration_secs);
        match &self.custom_text {
            Some(text) => request.with_custom_text(text.clone()),
            None => request,
        }
    }
}

impl From<&GenerationRequest> for Config {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            difficulty: request.difficulty,
            mode: request.mode,
            language: request.language,
            duration_secs: request.duration_secs,
            custom_text: request.custom_text.clone(),
        }
    }
}

pub trait ConfigStore {
    /// Load settings, falling back to defaults when they are missing or unusable
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typerush_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load without falling back. A missing file is not an error.
    pub fn try_load(&self) -> Result<Config, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice::<Config>(&bytes)?.validate()
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring config file");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            difficulty: Difficulty::Custom,
            mode: Mode::Quotes,
            language: Language::Spanish,
            duration_secs: 120,
            custom_text: Some("hola mundo".into()),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.try_load().unwrap(), Config::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = FileConfigStore::with_path(&path);

        assert_matches!(store.try_load(), Err(ConfigError::Parse(_)));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"duration_secs": 0}"#).unwrap();
        let store = FileConfigStore::with_path(&path);

        assert_matches!(store.try_load(), Err(ConfigError::Invalid(_)));
        assert_eq!(store.load().duration_secs, 60);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"mode": "numbers", "difficulty": "pro"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();

        assert_eq!(cfg.mode, Mode::Numbers);
        assert_eq!(cfg.difficulty, Difficulty::Pro);
        assert_eq!(cfg.language, Language::English);
        assert_eq!(cfg.duration_secs, 60);
    }

    #[test]
    fn request_carries_custom_text() {
        let cfg = Config {
            difficulty: Difficulty::Custom,
            custom_text: Some("type me".into()),
            ..Config::default()
        };
        let request = cfg.request();
        assert_eq!(request.trimmed_custom_text(), Some("type me"));
        assert_eq!(Config::from(&request), cfg);
    }
}
