use std::path::PathBuf;

const APP_DIR: &str = "mouse-follows-focus";

/// Get platform-specific configuration directory
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library/Application Support")
            .join(APP_DIR)
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Settings file, overridable with `MFF_CONFIG`.
pub fn settings_path() -> PathBuf {
    match std::env::var_os("MFF_CONFIG") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("settings.yaml"),
    }
}

pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}
