//! Application configuration loaded from a YAML or JSON file
use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `debug` seeds every store with demo data at startup, `release` starts empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Debug,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub mode: Mode,
    /// `EnvFilter` directive, `RUST_LOG` wins when set.
    pub log_level: String,
    pub log_format: LogFormat,
    /// Log to this file instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath_log: Option<PathBuf>,
    /// `upd_by` of the demo versions seeded in debug mode.
    pub actor: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Debug,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            filepath_log: None,
            actor: "admin".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a `.yaml`, `.yml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn seeds_demo_data(&self) -> bool {
        self.mode == Mode::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn yaml_uses_kebab_case_keys() {
        let (_dir, path) = write_config(
            "app.yaml",
            "mode: release\nlog-level: debug\nlog-format: json\nfilepath-log: /tmp/finance.log\n",
        );

        let config = AppConfig::from_file(path).unwrap();

        assert_eq!(config.mode, Mode::Release);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.filepath_log, Some(PathBuf::from("/tmp/finance.log")));
        assert_eq!(config.actor, "admin");
        assert!(!config.seeds_demo_data());
    }

    #[test]
    fn json_falls_back_to_defaults() {
        let (_dir, path) = write_config("app.json", r#"{"actor": "cli"}"#);

        let config = AppConfig::from_file(path).unwrap();

        assert_eq!(config.mode, Mode::Debug);
        assert_eq!(config.actor, "cli");
        assert!(config.seeds_demo_data());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let (_dir, path) = write_config("app.ini", "mode=debug");

        let err = AppConfig::from_file(path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
