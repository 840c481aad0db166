//! RON configuration file for the terminal front-end.
//!
//! Every field is optional in the file; anything left out keeps its default.
//! A missing file is not an error, and a file that does not parse is reported
//! and then ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::LogDestination;
use gallery_engine::{EngineSettings, FetchSettings, PageGeometry};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "gallery.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogSetting {
    #[default]
    File,
    Terminal,
    Both,
    Off,
}

impl From<LogSetting> for LogDestination {
    fn from(setting: LogSetting) -> Self {
        match setting {
            LogSetting::File => LogDestination::File,
            LogSetting::Terminal => LogDestination::Terminal,
            LogSetting::Both => LogDestination::Both,
            LogSetting::Off => LogDestination::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub paged: bool,
    pub slides: bool,
    pub article_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub download_concurrency: usize,
    pub user_agent: Option<String>,
    pub page_margin_cm: f64,
    pub protocol_relative_scheme: String,
    pub log: LogSetting,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            prefix: None,
            paged: true,
            slides: true,
            article_timeout_secs: 30,
            image_timeout_secs: 20,
            download_concurrency: 1,
            user_agent: None,
            page_margin_cm: 0.5,
            protocol_relative_scheme: "http".to_string(),
            log: LogSetting::File,
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        let mut article = FetchSettings::article();
        article.request_timeout = Duration::from_secs(self.article_timeout_secs.max(1));
        let mut image = FetchSettings::image();
        image.request_timeout = Duration::from_secs(self.image_timeout_secs.max(1));
        if let Some(agent) = self.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
            article.user_agent = agent.to_string();
            image.user_agent = agent.to_string();
        }

        EngineSettings {
            article,
            image,
            download_concurrency: self.download_concurrency.max(1),
            page: PageGeometry::a4(self.page_margin_cm),
            protocol_relative_scheme: self.protocol_relative_scheme.clone(),
            ..EngineSettings::default()
        }
    }
}

/// Outcome of reading the config file. Warnings are returned rather than
/// logged because the logger is configured from this very file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<String>,
}

pub fn load_config(path: &Path) -> LoadedConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return LoadedConfig {
                config: AppConfig::default(),
                warnings: Vec::new(),
            };
        }
        Err(err) => {
            return LoadedConfig {
                config: AppConfig::default(),
                warnings: vec![format!("Failed to read config from {:?}: {}", path, err)],
            };
        }
    };

    match ron::from_str::<AppConfig>(&content) {
        Ok(config) => LoadedConfig {
            config,
            warnings: Vec::new(),
        },
        Err(err) => LoadedConfig {
            config: AppConfig::default(),
            warnings: vec![format!(
                "Failed to parse config from {:?}: {}; using defaults",
                path, err
            )],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults_silently() {
        let temp = TempDir::new().unwrap();
        let loaded = load_config(&temp.path().join(DEFAULT_CONFIG_FILE));

        assert_eq!(loaded.config, AppConfig::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"(base_dir: Some("/data/gallery"), slides: false, download_concurrency: 4, log: Both)"#,
        )
        .unwrap();

        let loaded = load_config(&path);

        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.config.base_dir, Some(PathBuf::from("/data/gallery")));
        assert!(!loaded.config.slides);
        assert!(loaded.config.paged);
        assert_eq!(loaded.config.log, LogSetting::Both);
        assert_eq!(loaded.config.engine_settings().download_concurrency, 4);
    }

    #[test]
    fn unparseable_file_warns_and_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "(paged: maybe").unwrap();

        let loaded = load_config(&path);

        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to parse config"));
    }

    #[test]
    fn engine_settings_carry_timeouts_and_agent() {
        let config = AppConfig {
            article_timeout_secs: 5,
            image_timeout_secs: 0,
            user_agent: Some("TestAgent/1.0".to_string()),
            ..AppConfig::default()
        };

        let settings = config.engine_settings();

        assert_eq!(settings.article.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.image.request_timeout, Duration::from_secs(1));
        assert_eq!(settings.image.user_agent, "TestAgent/1.0");
    }
}
