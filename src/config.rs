use crate::error::{PasterError, Result};
use crate::hotkey::{KeyCombo, TRIGGER_CASCADE, TRIGGER_SEARCH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DB_FILENAME: &str = "templates.json";
pub const CONFIG_FILENAME: &str = "config.json";
pub const LOG_FILENAME: &str = "paster.log";
/// Overrides the data directory when set.
pub const HOME_ENV: &str = "PASTER_HOME";

pub const DEFAULT_SEARCH_HOTKEY: &str = "<ctrl>+1";
pub const DEFAULT_CASCADE_HOTKEY: &str = "<ctrl>+2";

/// Get the paster data directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".paster"))
        .unwrap_or_else(|_| PathBuf::from(".paster"))
}

/// Locations of every file the application keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `--data-dir` if given, otherwise the default data directory.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        Self::new(data_dir.unwrap_or_else(get_config_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn db_file(&self) -> PathBuf {
        self.dir.join(DB_FILENAME)
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join(LOG_FILENAME)
    }

    /// Ensure the data directory exists
    pub fn ensure_dir(&self) -> Result<&Path> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(&self.dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub auto_paste: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Trigger name to key-combination descriptor.
    pub hotkeys: BTreeMap<String, String>,
    pub features: Features,
}

impl Default for Config {
    fn default() -> Self {
        let mut hotkeys = BTreeMap::new();
        hotkeys.insert(TRIGGER_SEARCH.to_string(), DEFAULT_SEARCH_HOTKEY.to_string());
        hotkeys.insert(TRIGGER_CASCADE.to_string(), DEFAULT_CASCADE_HOTKEY.to_string());
        Self {
            hotkeys,
            features: Features::default(),
        }
    }
}

/// What a config file may contain; anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    #[serde(default)]
    hotkeys: Option<BTreeMap<String, String>>,
    #[serde(default)]
    features: Option<PartialFeatures>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialFeatures {
    #[serde(default)]
    auto_paste: Option<bool>,
}

impl Config {
    pub fn hotkey(&self, trigger: &str) -> Option<&str> {
        self.hotkeys.get(trigger).map(String::as_str)
    }

    fn merge(&mut self, partial: PartialConfig) {
        if let Some(hotkeys) = partial.hotkeys {
            self.hotkeys.extend(hotkeys);
        }
        if let Some(auto_paste) = partial.features.and_then(|f| f.auto_paste) {
            self.features.auto_paste = auto_paste;
        }
    }

    /// Replace both bindings after validating them together.
    pub fn set_hotkeys(&mut self, search: &str, cascade: &str) -> Result<()> {
        let (search, cascade) = validate_hotkeys(search, cascade)?;
        self.hotkeys.insert(TRIGGER_SEARCH.to_string(), search);
        self.hotkeys.insert(TRIGGER_CASCADE.to_string(), cascade);
        Ok(())
    }
}

/// Both descriptors must be non-empty, must parse, and must not describe
/// the same key combination. Returns them trimmed.
pub fn validate_hotkeys(search: &str, cascade: &str) -> Result<(String, String)> {
    let search = search.trim();
    let cascade = cascade.trim();
    let search_combo: KeyCombo = search.parse()?;
    let cascade_combo: KeyCombo = cascade.parse()?;
    if search_combo == cascade_combo {
        return Err(PasterError::InvalidHotkey {
            descriptor: cascade.to_string(),
            reason: "the search and cascade hotkeys must differ".to_string(),
        });
    }
    Ok((search.to_string(), cascade.to_string()))
}

/// Load the configuration, writing defaults when the file is missing or
/// unreadable. Keys absent from the file keep their default values.
pub fn load_config(path: &Path) -> Config {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                info!(path = %path.display(), "Creating default configuration");
            } else {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read configuration, using defaults"
                );
            }
            return write_defaults(path);
        }
    };

    match serde_json::from_str::<PartialConfig>(&text) {
        Ok(partial) => {
            let mut config = Config::default();
            config.merge(partial);
            config
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Invalid configuration, replacing it with defaults"
            );
            write_defaults(path)
        }
    }
}

fn write_defaults(path: &Path) -> Config {
    let config = Config::default();
    if let Err(e) = save_config(path, &config) {
        warn!(path = %path.display(), error = %e, "Failed to write default configuration");
    }
    config
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let serialized = serde_json::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = Paths::new(dir.path()).config_file();

        let config = load_config(&path);
        assert_eq!(config, Config::default());
        assert_eq!(config.hotkey(TRIGGER_SEARCH), Some("<ctrl>+1"));
        assert_eq!(config.hotkey(TRIGGER_CASCADE), Some("<ctrl>+2"));
        assert!(!config.features.auto_paste);
        assert!(path.exists());
    }

    #[test]
    fn test_partial_config_is_merged_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"{ "hotkeys": { "search": "<alt>+s" }, "features": { "auto_paste": true } }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.hotkey(TRIGGER_SEARCH), Some("<alt>+s"));
        assert_eq!(config.hotkey(TRIGGER_CASCADE), Some(DEFAULT_CASCADE_HOTKEY));
        assert!(config.features.auto_paste);
    }

    #[test]
    fn test_corrupt_config_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[1, 2").unwrap();

        assert_eq!(load_config(&path), Config::default());
        let rewritten: Config =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, Config::default());
    }

    #[test]
    fn test_set_hotkeys_validates_pair() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_hotkeys("", "<ctrl>+2"),
            Err(PasterError::InvalidHotkey { .. })
        ));
        assert!(matches!(
            config.set_hotkeys("<ctrl>+3", "ctrl+3"),
            Err(PasterError::InvalidHotkey { .. })
        ));
        assert_eq!(config, Config::default());

        config.set_hotkeys(" <alt>+1 ", "<alt>+2").unwrap();
        assert_eq!(config.hotkey(TRIGGER_SEARCH), Some("<alt>+1"));

        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_paths_layout() {
        let paths = Paths::resolve(Some(PathBuf::from("/tmp/paster-test")));
        assert_eq!(paths.db_file(), PathBuf::from("/tmp/paster-test/templates.json"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/paster-test/paster.log"));
    }
}
