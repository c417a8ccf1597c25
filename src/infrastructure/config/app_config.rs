//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;
use crate::domain::entities::Dimensions;
use crate::infrastructure::image::{DEFAULT_SCREEN, LoaderConfig};

pub(crate) const APP_NAME: &str = "pixpick";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from TOML and overridden from the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image loader tuning.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Display geometry.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Display geometry used to size decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Screen width in pixels, the last size fallback.
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,

    /// Screen height in pixels.
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,

    /// Thumbnail width in pixels.
    #[serde(default = "default_thumbnail_edge")]
    pub thumbnail_width: u32,

    /// Thumbnail height in pixels.
    #[serde(default = "default_thumbnail_edge")]
    pub thumbnail_height: u32,
}

const fn default_screen_width() -> u32 {
    DEFAULT_SCREEN.width
}

const fn default_screen_height() -> u32 {
    DEFAULT_SCREEN.height
}

const fn default_thumbnail_edge() -> u32 {
    256
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            thumbnail_width: default_thumbnail_edge(),
            thumbnail_height: default_thumbnail_edge(),
        }
    }
}

impl DisplayConfig {
    /// Screen extent.
    #[must_use]
    pub const fn screen(&self) -> Dimensions {
        Dimensions::new(self.screen_width, self.screen_height)
    }

    /// Thumbnail target size.
    #[must_use]
    pub const fn thumbnail(&self) -> Dimensions {
        Dimensions::new(self.thumbnail_width, self.thumbnail_height)
    }
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(workers) = args.workers {
            self.loader.worker_count = workers;
        }
        if let Some(discipline) = args.discipline {
            self.loader.queue_discipline = discipline;
        }
        if let Some(cache_bytes) = args.cache_bytes {
            self.loader.cache_capacity_bytes = cache_bytes;
        }
        if let Some(width) = args.width {
            self.display.thumbnail_width = width;
        }
        if let Some(height) = args.height {
            self.display.thumbnail_height = height;
        }
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("pixpick.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::infrastructure::image::QueueDiscipline;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [loader]
            worker_count = 6
            queue_discipline = "fifo"

            [display]
            thumbnail_width = 128
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.loader.worker_count, 6);
        assert_eq!(config.loader.queue_discipline, QueueDiscipline::Fifo);
        assert_eq!(
            config.loader.cache_capacity_bytes,
            LoaderConfig::default().cache_capacity_bytes
        );
        assert_eq!(config.display.thumbnail(), Dimensions::new(128, 256));
        assert_eq!(config.display.screen(), DEFAULT_SCREEN);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.loader.worker_count, 3);
        assert_eq!(config.loader.queue_discipline, QueueDiscipline::Lifo);
        assert_eq!(config.display.thumbnail(), Dimensions::new(256, 256));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config: AppConfig =
            toml::from_str("[loader]\nworker_count = 8\n").expect("Failed to parse config");
        let args = CliArgs::parse_from([
            "pixpick",
            "--workers",
            "2",
            "--discipline",
            "fifo",
            "--width",
            "64",
            "--log-level",
            "trace",
            "photos",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.loader.worker_count, 2);
        assert_eq!(config.loader.queue_discipline, QueueDiscipline::Fifo);
        assert_eq!(config.display.thumbnail(), Dimensions::new(64, 256));
        assert_eq!(config.log_level, LogLevel::Trace);
    }

    #[test]
    fn test_cli_log_path_wins() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from(["pixpick", "--log-path", "/tmp/pixpick-test.log"]);

        config.merge_with_args(&args);

        assert_eq!(
            config.effective_log_path(),
            Some(PathBuf::from("/tmp/pixpick-test.log"))
        );
    }

    #[test]
    fn test_default_config_survives_toml() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }
}
