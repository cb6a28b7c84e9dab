//! Runtime configuration from environment variables.
//!
//! | Variable                    | Default        |
//! |-----------------------------|----------------|
//! | `LOANRISK_ARTIFACT_DIR`     | `models`       |
//! | `LOANRISK_LOG_MODE`         | `auto`         |
//! | `LOANRISK_LOG_FILE`         | `loanrisk.log` |
//! | `LOANRISK_REQUIRE_MANIFEST` | `true`         |

use std::path::PathBuf;

pub const ARTIFACT_DIR_ENV: &str = "LOANRISK_ARTIFACT_DIR";
pub const LOG_MODE_ENV: &str = "LOANRISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "LOANRISK_LOG_FILE";
pub const REQUIRE_MANIFEST_ENV: &str = "LOANRISK_REQUIRE_MANIFEST";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub require_manifest: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("models"),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("loanrisk.log"),
            require_manifest: true,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(dir) = lookup(ARTIFACT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.artifact_dir = PathBuf::from(dir);
        }
        if let Some(mode) = lookup(LOG_MODE_ENV) {
            cfg.log_mode = LogMode::parse(&mode);
        }
        if let Some(file) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.log_file = PathBuf::from(file);
        }
        if let Some(v) = lookup(REQUIRE_MANIFEST_ENV) {
            cfg.require_manifest = !matches!(v.as_str(), "0" | "false" | "FALSE" | "no" | "NO");
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ARTIFACT_DIR_ENV, "/srv/artifacts"),
            (LOG_MODE_ENV, "STDOUT"),
            (REQUIRE_MANIFEST_ENV, "false"),
        ]
        .into_iter()
        .collect();
        let cfg = AppConfig::from_lookup(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/artifacts"));
        assert_eq!(cfg.log_mode, LogMode::Stdout);
        assert!(!cfg.require_manifest);
        assert_eq!(cfg.log_file, PathBuf::from("loanrisk.log"));
    }
}
