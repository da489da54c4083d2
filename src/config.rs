//! Runtime settings read from the environment.
//!
//! `load_env_files` reads `.env.{APP_ENV}` then `.env`; variables already set
//! in the process environment win over both.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/hotel";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Test => "test",
            AppEnv::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "test" => Ok(AppEnv::Test),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub env: AppEnv,
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub body_limit_bytes: usize,
    /// Create the database named in `database_url` when it does not exist.
    pub ensure_database: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let env = match var("APP_ENV") {
            Some(v) => v.parse()?,
            None => AppEnv::Development,
        };
        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections = parse_or("DB_MAX_CONNECTIONS", var("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                value: "0".into(),
            });
        }
        let bind_addr = match var("BIND_ADDR") {
            Some(v) => parse_value("BIND_ADDR", &v)?,
            None => parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };
        let body_limit_bytes = parse_or("BODY_LIMIT_BYTES", var("BODY_LIMIT_BYTES"), DEFAULT_BODY_LIMIT_BYTES)?;
        let ensure_database = match var("ENSURE_DATABASE") {
            Some(v) => parse_bool("ENSURE_DATABASE", &v)?,
            None => env != AppEnv::Production,
        };

        Ok(Settings {
            env,
            database_url,
            max_connections,
            bind_addr,
            body_limit_bytes,
            ensure_database,
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Load `.env.{APP_ENV}` and `.env` from the working directory and return
/// the files that were read. Missing files are skipped; unreadable or
/// malformed ones are errors.
pub fn load_env_files() -> Result<Vec<PathBuf>, ConfigError> {
    let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| AppEnv::Development.as_str().to_string());
    load_env_files_from(Path::new("."), &app_env)
}

pub fn load_env_files_from(dir: &Path, app_env: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let mut loaded = Vec::new();
    for name in [format!(".env.{}", app_env), ".env".to_string()] {
        let path = dir.join(name);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(path),
            Err(e) if e.not_found() => {}
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
    Ok(loaded)
}
