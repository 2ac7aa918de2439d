use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_DATABASE_URL: &str = "sqlite:pinmonl.db?mode=rwc";
const DEFAULT_ADDRESS: &str = "127.0.0.1:3399";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub address: SocketAddr,
    pub max_connections: u32,
}

impl Config {
    /// Reads `DATABASE_URL`, `PINMONL_ADDRESS` and `PINMONL_DB_MAX_CONNECTIONS`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let address = lookup("PINMONL_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let address = address
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid PINMONL_ADDRESS: {}", address))?;

        let max_connections = match lookup("PINMONL_DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("invalid PINMONL_DB_MAX_CONNECTIONS: {}", v))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            address,
            max_connections,
        })
    }
}
