use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::qa::DEFAULT_ENDPOINT;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfask";

/// Persistent settings. Credentials are deliberately not part of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Seconds to wait for an answer; absent means wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Directory the file picker starts in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            endpoint: default_endpoint(),
            request_timeout_secs: None,
            documents_dir: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Version 0 files predate the version key; their fields carry over as is.

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!("endpoint: {}\n", yaml_scalar(&settings.endpoint)));
    content.push('\n');
    content.push_str(OPTIONAL_SETTINGS_TEMPLATE);

    if let Some(secs) = settings.request_timeout_secs {
        content.push_str(&format!("request_timeout_secs: {secs}\n"));
    }
    if let Some(dir) = &settings.documents_dir {
        content.push_str(&format!(
            "documents_dir: {}\n",
            yaml_scalar(&dir.to_string_lossy())
        ));
    }

    content
}

/// A string as a single YAML scalar, quoted and escaped as needed
fn yaml_scalar(value: &str) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

const OPTIONAL_SETTINGS_TEMPLATE: &str = r#"# ============================================================================
# Optional settings
# ============================================================================
# request_timeout_secs: 120      # give up on an answer after this many seconds
# documents_dir: "/home/me/pdf"  # where the file picker starts
#
# API keys are typed into the app and never stored here.

"#;

// Public API for accessing settings

pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn reset() {
        if let Ok(mut global) = SETTINGS.write() {
            *global = Settings::default();
        }
    }

    #[test]
    fn defaults_point_at_public_endpoint() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn zero_timeout_means_none() {
        let settings = Settings {
            request_timeout_secs: Some(0),
            ..Settings::default()
        };
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            version: CURRENT_VERSION,
            endpoint: "http://localhost:8000/question".to_string(),
            request_timeout_secs: Some(90),
            documents_dir: Some(PathBuf::from("/tmp/papers")),
        };
        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn default_yaml_omits_optional_keys() {
        let yaml = generate_settings_yaml(&Settings::default());
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, Settings::default());
        assert!(yaml.contains("# request_timeout_secs"));
    }

    #[test]
    fn quotes_and_backslashes_survive_saving() {
        let settings = Settings {
            endpoint: "http://host/q?name=\"x\"".to_string(),
            documents_dir: Some(PathBuf::from(r"C:\Users\me\Documents\pdf")),
            ..Settings::default()
        };
        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    #[serial]
    fn saved_file_with_windows_path_loads_back() {
        reset();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let settings = Settings {
            documents_dir: Some(PathBuf::from(r"D:\papers\2024")),
            ..Settings::default()
        };

        save_settings_to_file(&settings, &path);
        load_settings_from_path(&path);
        assert_eq!(current(), settings);
        reset();
    }

    #[test]
    #[serial]
    fn load_from_path_replaces_globals() {
        reset();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "version: 1\nendpoint: \"http://127.0.0.1:9999/q\"\nrequest_timeout_secs: 5\n",
        )
        .unwrap();

        load_settings_from_path(&path);
        let settings = current();
        assert_eq!(settings.endpoint, "http://127.0.0.1:9999/q");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(5)));
        assert!(settings.documents_dir.is_none());
        reset();
    }

    #[test]
    #[serial]
    fn old_version_is_migrated_and_rewritten() {
        reset();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\ndocuments_dir: \"/srv/pdf\"\n").unwrap();

        load_settings_from_path(&path);
        let settings = current();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.documents_dir, Some(PathBuf::from("/srv/pdf")));
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains(&format!("version: {CURRENT_VERSION}")));
        reset();
    }

    #[test]
    #[serial]
    fn broken_file_keeps_previous_settings() {
        reset();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "endpoint: [not, a, string\n").unwrap();

        load_settings_from_path(&path);
        assert_eq!(current(), Settings::default());
    }
}
