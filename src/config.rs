use std::path::{Path, PathBuf};

use anyhow::Context;
use directories_next::ProjectDirs;
use serde::Deserialize;
use tracing::warn;

use crate::ids::MAX_ID_LEN;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefix prepended to paste paths in returned links.
    pub base_url: String,
    pub port: u16,
    pub database: Database,
    #[serde(default)]
    pub ids: Ids,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    /// Connection URL; its scheme selects the backend (`sqlite:` or `mysql:`).
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ids {
    pub length: usize,
}

impl Default for Ids {
    fn default() -> Self {
        Ids { length: 8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub max_upload_size: usize,
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&source).context("failed to deserialize config")?;
        Ok(config.clamped())
    }

    /// Default location of the config file, `config.toml` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tinypaste").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn clamped(mut self) -> Self {
        if self.ids.length > MAX_ID_LEN {
            warn!(
                "configured id length {} exceeds the maximum, using {MAX_ID_LEN}",
                self.ids.length
            );
            self.ids.length = MAX_ID_LEN;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_owned();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
        base_url = "https://paste.example.org/"
        port = 8080

        [database]
        url = "sqlite://pastes.db"

        [ids]
        length = 64

        [limits]
        max_upload_size = 1048576
    "#;

    #[test]
    fn loads_and_clamps_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.base_url, "https://paste.example.org");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.url, "sqlite://pastes.db");
        assert_eq!(config.ids.length, MAX_ID_LEN);
        assert_eq!(config.limits.max_upload_size, 1048576);
    }

    #[test]
    fn id_length_defaults_when_omitted() {
        let config: Config = toml::from_str(
            r#"
            base_url = ""
            port = 1
            [database]
            url = "sqlite::memory:"
            [limits]
            max_upload_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.ids.length, 8);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(dir.path().join("nope.toml")).is_err());
    }
}
