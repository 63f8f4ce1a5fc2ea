// src/config.rs
//! Service configuration loaded from TOML.
//!
//! Lookup order:
//! 1) `$ENGINE_CONFIG_PATH` (must exist when set)
//! 2) `config/engine.toml`
//! 3) built-in defaults
//!
//! `ENGINE_BIND_ADDR` and `ENGINE_LOG` override the file afterwards.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";
pub const ENV_BIND_ADDR: &str = "ENGINE_BIND_ADDR";
pub const ENV_LOG: &str = "ENGINE_LOG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub assessments: AssessmentSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Permissive CORS for browser front-ends.
    #[serde(default = "default_true")]
    pub cors: bool,
    /// Expose `/metrics` in Prometheus format.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors: true,
            metrics: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentSection {
    /// History entries returned by `GET /assessments/{id}`.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AssessmentSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_true() -> bool {
    true
}
fn default_history_limit() -> usize {
    50
}
fn default_log_filter() -> String {
    "narrative_engine=info,scoring=info,warn".to_string()
}

impl EngineConfig {
    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Env path → default path → defaults, then env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            if !addr.trim().is_empty() {
                self.server.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(filter) = std::env::var(ENV_LOG) {
            if !filter.trim().is_empty() {
                self.log.filter = filter.trim().to_string();
            }
        }
    }

    fn sanitize(&mut self) {
        if self.assessments.history_limit == 0 {
            self.assessments.history_limit = default_history_limit();
        }
        if self.server.bind_addr.trim().is_empty() {
            self.server.bind_addr = default_bind_addr();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = EngineConfig::parse(
            r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:9000");
        assert!(cfg.server.cors);
        assert!(cfg.log.json);
        assert_eq!(cfg.log.filter, default_log_filter());
        assert_eq!(cfg.assessments.history_limit, 50);
    }

    #[test]
    fn zero_history_limit_is_sanitized() {
        let cfg = EngineConfig::parse("[assessments]\nhistory_limit = 0\n").unwrap();
        assert_eq!(cfg.assessments.history_limit, 50);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(EngineConfig::parse("[server\nbind_addr = 1").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_then_overrides() {
        let dir = env::temp_dir().join(format!("engine_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.toml");
        fs::write(&path, "[assessments]\nhistory_limit = 5\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, path.display().to_string());
        env::set_var(ENV_BIND_ADDR, "127.0.0.1:1234");
        let cfg = EngineConfig::load_default().unwrap();
        assert_eq!(cfg.assessments.history_limit, 5);
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:1234");

        env::set_var(ENV_CONFIG_PATH, dir.join("missing.toml").display().to_string());
        assert!(EngineConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_BIND_ADDR);
        let _ = fs::remove_dir_all(&dir);
    }
}
