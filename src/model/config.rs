use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::tagref::RepairMode;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: HostConfig,
    pub tagrefs: TagrefConfig,
    pub workfile: WorkfileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub binary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagrefConfig {
    pub mode: RepairMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkfileConfig {
    pub suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user_path = user_config_path().filter(|p| p.exists());
        Self::load_from(user_path.as_deref())
    }

    /// Load the built-in defaults, merging the table at `user_path` over them.
    pub fn load_from(user_path: Option<&Path>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULTS)?;

        if let Some(path) = user_path {
            let user_str = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let user: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("parsing config {}", path.display()))?;
            merge_tables(&mut merged, user);
        }

        let mut config: AppConfig = toml::Value::Table(merged).try_into()?;

        // Expand ~ in the host binary path
        if config.host.binary.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.host.binary = config
                .host
                .binary
                .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    pub fn host_binary(&self) -> PathBuf {
        PathBuf::from(&self.host.binary)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_tbl)), toml::Value::Table(over_tbl)) => {
                merge_tables(base_tbl, over_tbl);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "pathops")
}

fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = AppConfig::load_from(None).unwrap();
        assert_eq!(config.host.binary, "inkscape");
        assert_eq!(config.tagrefs.mode, RepairMode::Purge);
        assert_eq!(config.workfile.suffix, "-pathops.svg");
        assert_eq!(config.logging.filter, "pathops=info");
    }

    #[test]
    fn user_config_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[host]\nbinary = \"/opt/inkscape/bin/inkscape\"\n[tagrefs]\nmode = \"placeholder\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.host.binary, "/opt/inkscape/bin/inkscape");
        assert_eq!(config.tagrefs.mode, RepairMode::Placeholder);
        // untouched sections keep their defaults
        assert_eq!(config.workfile.suffix, "-pathops.svg");
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tagrefs]\nmode = \"shred\"\n").unwrap();

        assert!(AppConfig::load_from(Some(&path)).is_err());
    }
}
