// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{DEFAULT_API_BASE_URL, DEFAULT_PROCESS_LIMIT};

pub const DEFAULT_CONFIG_PATH: &str = "config/desk.toml";

pub const ENV_CONFIG_PATH: &str = "DESK_CONFIG_PATH";
pub const ENV_API_BASE_URL: &str = "DESK_API_BASE_URL";
pub const ENV_BIND_ADDR: &str = "DESK_BIND_ADDR";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_page_size() -> u32 {
    10
}
fn default_search_limit() -> u32 {
    10
}
fn default_process_limit() -> u32 {
    DEFAULT_PROCESS_LIMIT
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Research backend root, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// `limit` of the default paper list.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Papers per "Process Papers Now".
    #[serde(default = "default_process_limit")]
    pub process_limit: u32,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            bind_addr: default_bind_addr(),
            page_size: default_page_size(),
            search_limit: default_search_limit(),
            process_limit: default_process_limit(),
            static_dir: default_static_dir(),
        }
    }
}

impl DeskConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading desk config from {}", path.display()))?;
        let cfg: DeskConfig = toml::from_str(&data)
            .with_context(|| format!("parsing desk config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolution order:
    /// 1) $DESK_CONFIG_PATH (must exist)
    /// 2) config/desk.toml (optional)
    /// 3) built-in defaults
    ///
    /// then `DESK_API_BASE_URL` / `DESK_BIND_ADDR` override the file.
    pub fn load() -> Result<Self> {
        let base = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(&p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path: {p}"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(addr) = non_empty_env(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        if self.api_base_url.is_empty() {
            self.api_base_url = default_api_base_url();
        }
        self.page_size = self.page_size.max(1);
        self.search_limit = self.search_limit.max(1);
        self.process_limit = self.process_limit.max(1);
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_env() {
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_API_BASE_URL);
        env::remove_var(ENV_BIND_ADDR);
    }

    #[test]
    fn partial_file_fills_defaults_and_sanitizes() {
        let cfg: DeskConfig = toml::from_str(
            r#"
            api_base_url = "http://research.internal:5000/api/"
            page_size = 0
            "#,
        )
        .unwrap();
        let cfg = cfg.sanitized();
        assert_eq!(cfg.api_base_url, "http://research.internal:5000/api");
        assert_eq!(cfg.page_size, 1);
        assert_eq!(cfg.search_limit, 10);
        assert_eq!(cfg.process_limit, 10);
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000");
    }

    #[serial_test::serial]
    #[test]
    fn env_path_then_overrides_win() {
        clear_env();
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("desk.toml");
        fs::write(&p, "api_base_url = \"http://file:5000/api\"\nsearch_limit = 25\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let from_file = DeskConfig::load().unwrap();
        assert_eq!(from_file.api_base_url, "http://file:5000/api");
        assert_eq!(from_file.search_limit, 25);

        env::set_var(ENV_API_BASE_URL, "http://env:6000/api");
        env::set_var(ENV_BIND_ADDR, "0.0.0.0:8080");
        let overridden = DeskConfig::load().unwrap();
        assert_eq!(overridden.api_base_url, "http://env:6000/api");
        assert_eq!(overridden.bind_addr, "0.0.0.0:8080");
        assert_eq!(overridden.search_limit, 25);

        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn missing_explicit_path_is_an_error() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/desk.toml");
        assert!(DeskConfig::load().is_err());
        clear_env();
    }
}
