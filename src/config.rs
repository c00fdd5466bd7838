use anyhow::{bail, Context, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Storage - in-memory unless a file URL is given
            database_url: std::env::var("LANGUAGE_PROFILE_DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: match std::env::var("LANGUAGE_PROFILE_MAX_CONNECTIONS") {
                Ok(v) => parse_max_connections(&v)?,
                Err(_) => 4,
            },
        })
    }

    /// Whether the configured database lives only in memory.
    pub fn is_in_memory(&self) -> bool {
        is_in_memory_url(&self.database_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 4,
        }
    }
}

fn parse_max_connections(value: &str) -> Result<u32> {
    let max_connections: u32 = value
        .parse()
        .context("LANGUAGE_PROFILE_MAX_CONNECTIONS must be a positive integer")?;
    if max_connections == 0 {
        bail!("LANGUAGE_PROFILE_MAX_CONNECTIONS must be a positive integer, got 0");
    }
    Ok(max_connections)
}

pub(crate) fn is_in_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
