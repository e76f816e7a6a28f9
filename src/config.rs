use anyhow::{Context, Result};
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

pub const DEFAULT_MODEL_PATH: &str = "models/yogyakarta_model.pt";
pub const DEFAULT_META_PATH: &str = "models/yogyakarta_meta.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Startup settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub log_rows: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
        let meta_path = lookup("META_PATH").unwrap_or_else(|| DEFAULT_META_PATH.to_string());

        let host: IpAddr = match lookup("HOST") {
            Some(h) => h
                .parse()
                .with_context(|| format!("HOST is not an IP address: {}", h))?,
            None => DEFAULT_HOST.parse()?,
        };
        let port: u16 = match lookup("PORT") {
            Some(p) => p
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", p))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            model_path: PathBuf::from(model_path),
            meta_path: PathBuf::from(meta_path),
            host,
            port,
            log_rows: lookup("LOG_PRED").as_deref() == Some("1"),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Finds an artifact on disk: absolute paths as given, relative paths
/// against the working directory first, then next to the executable.
/// Falls back to the input so the loader reports the original path.
pub fn resolve_artifact(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let mut candidates = vec![path.to_path_buf()];
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        candidates.push(exe.join(path));
    }

    candidates
        .into_iter()
        .find(|c| c.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
