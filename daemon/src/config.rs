//! `settings.yaml` loading and saving.

use crate::paths;
use mff_core::FollowConfig;
use mff_platform::FocusSourceConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the daemon reads from `settings.yaml`. Engine settings sit at
/// the top level of the file; host-specific knobs live under `focus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub follow: FollowConfig,
    pub focus: FocusSourceConfig,
}

/// Load a YAML configuration file from disk
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Save a configuration to a YAML file
pub fn save_yaml<T: Serialize>(path: impl AsRef<Path>, config: &T) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load settings from `path`.
/// Returns default settings if the file doesn't exist or is invalid.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = if path.exists() {
        match load_yaml::<Settings>(path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}, using defaults", path, e);
                Settings::default()
            }
        }
    } else {
        tracing::debug!("No settings file at {:?}, using defaults", path);
        Settings::default()
    };

    settings.follow = settings.follow.validate();
    settings
}

/// Load settings from the user config directory (or `MFF_CONFIG`).
pub fn load_settings() -> Settings {
    load_settings_from(&paths::settings_path())
}

/// Save settings to the user config directory (or `MFF_CONFIG`).
pub fn save_settings(settings: &Settings) -> anyhow::Result<()> {
    let path = paths::settings_path();
    save_yaml(&path, settings)?;
    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mff_core::Color;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("nope.yaml"));
        assert_eq!(settings, Settings::default());
        assert!(settings.follow.active);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "active: false\nsuppression:\n  radius_px: 8\nindicator:\n  color: \"#00FF00\"\nfocus:\n  poll_interval_ms: 250\n",
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert!(!settings.follow.active);
        assert_eq!(settings.follow.suppression.radius_px, 8);
        assert_eq!(settings.follow.suppression.interval_ms, 200);
        assert_eq!(settings.follow.indicator.color, Color::new(0, 255, 0));
        assert_eq!(settings.focus.poll_interval_ms, 250);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "indicator:\n  color: not-a-color\n").unwrap();

        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "suppression:\n  interval_ms: 0\n  radius_px: 1000\n").unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.follow.suppression.interval_ms, 1);
        assert_eq!(settings.follow.suppression.radius_px, 64);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");

        let mut settings = Settings::default();
        settings.follow.recording = true;
        settings.follow.indicator.enabled = false;
        save_yaml(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path), settings);
    }
}
