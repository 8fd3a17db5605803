use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Directory for persistent state (SQLite database).
    /// Defaults to current working directory.
    pub state_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = parse_port(env::var("PORT").ok())?;

        let state_dir = env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Config { port, state_dir })
    }

    /// Path of the SQLite database file inside the state directory.
    pub fn database_path(&self) -> PathBuf {
        self.state_dir.join("roster.db")
    }
}

/// Parse PORT from an optional string value, defaulting to 8080.
fn parse_port(value: Option<String>) -> Result<u16> {
    value
        .unwrap_or_else(|| "8080".to_string())
        .parse::<u16>()
        .context("PORT must be a valid number")
}
