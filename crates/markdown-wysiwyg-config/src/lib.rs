use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Colour scheme the host is currently showing. Diagram renders are keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "default",
            Theme::Dark => "dark",
        }
    }
}

/// Security level handed to the diagram renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramSecurityLevel {
    #[default]
    Strict,
    Loose,
    Antiscript,
    Sandbox,
}

impl DiagramSecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramSecurityLevel::Strict => "strict",
            DiagramSecurityLevel::Loose => "loose",
            DiagramSecurityLevel::Antiscript => "antiscript",
            DiagramSecurityLevel::Sandbox => "sandbox",
        }
    }
}

/// Tuning for the split-pane scroll synchronisation.
///
/// Times are milliseconds, distances are CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSyncSettings {
    pub enabled: bool,
    /// How long the pane the user is scrolling stays authoritative.
    pub driver_lock_ms: f64,
    /// Scroll events within this distance of our own last write are echoes.
    pub epsilon_px: f64,
    /// Fraction of the remaining distance covered per animation frame.
    pub lerp: f64,
    /// Time constant of the manual-scroll offset decay.
    pub offset_tau_ms: f64,
    /// The offset is dropped once it decays below this fraction of its start value.
    pub offset_discard_ratio: f64,
    pub boundary_min_px: f64,
    pub boundary_max_px: f64,
    /// Boundary snap tolerance as a fraction of the scrollable range.
    pub boundary_ratio: f64,
    /// Cap on target-height / source-height amplification during direct lookup.
    pub max_height_ratio: f64,
}

impl Default for ScrollSyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            driver_lock_ms: 160.0,
            epsilon_px: 1.0,
            lerp: 0.25,
            offset_tau_ms: 150.0,
            offset_discard_ratio: 0.01,
            boundary_min_px: 2.0,
            boundary_max_px: 12.0,
            boundary_ratio: 0.01,
            max_height_ratio: 3.0,
        }
    }
}

fn default_math_cache_capacity() -> usize {
    200
}

fn default_diagram_cache_capacity() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory documents are opened from; relative image paths resolve per document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub diagram_security_level: DiagramSecurityLevel,
    #[serde(default = "default_math_cache_capacity")]
    pub math_cache_capacity: usize,
    #[serde(default = "default_diagram_cache_capacity")]
    pub diagram_cache_capacity: usize,
    #[serde(default)]
    pub scroll_sync: ScrollSyncSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_path: None,
            theme: Theme::default(),
            diagram_security_level: DiagramSecurityLevel::default(),
            math_cache_capacity: default_math_cache_capacity(),
            diagram_cache_capacity: default_diagram_cache_capacity(),
            scroll_sync: ScrollSyncSettings::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the documents path
        config.documents_path = config
            .documents_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the user config, falling back to defaults when none exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-wysiwyg");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-wysiwyg/config.toml"));
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.math_cache_capacity, 200);
        assert_eq!(config.diagram_cache_capacity, 50);
        assert_eq!(config.scroll_sync.driver_lock_ms, 160.0);
        assert_eq!(config.scroll_sync.lerp, 0.25);
    }

    #[test]
    fn test_partial_scroll_sync_table_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
theme = "dark"
diagram_security_level = "loose"

[scroll_sync]
driver_lock_ms = 200.0
"#,
        )
        .unwrap();

        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.diagram_security_level, DiagramSecurityLevel::Loose);
        assert_eq!(config.scroll_sync.driver_lock_ms, 200.0);
        assert_eq!(config.scroll_sync.epsilon_px, 1.0);
        assert!(config.scroll_sync.enabled);
    }

    #[test]
    fn test_unknown_security_level_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "diagram_security_level = \"wide-open\"\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(
            result,
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("MDW_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$MDW_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("MDW_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            documents_path: Some(PathBuf::from("/tmp/test-notes")),
            theme: Theme::Dark,
            diagram_security_level: DiagramSecurityLevel::Sandbox,
            math_cache_capacity: 10,
            diagram_cache_capacity: 5,
            scroll_sync: ScrollSyncSettings {
                enabled: false,
                ..ScrollSyncSettings::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_documents_path_with_env_var_is_expanded_on_load() {
        unsafe {
            env::set_var("MDW_NOTES_ROOT", "/custom/notes");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "documents_path = \"$MDW_NOTES_ROOT/docs\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.documents_path,
            Some(PathBuf::from("/custom/notes/docs"))
        );

        unsafe {
            env::remove_var("MDW_NOTES_ROOT");
        }
    }

    #[test]
    fn test_theme_and_security_names() {
        assert_eq!(Theme::Dark.as_str(), "dark");
        assert_eq!(Theme::Light.as_str(), "default");
        assert_eq!(DiagramSecurityLevel::Antiscript.as_str(), "antiscript");
    }
}
