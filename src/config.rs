use clap::Parser;

use crate::utils::RetryConfig;

/// Runtime configuration. Every flag can also come from the environment
/// (or a `.env` file loaded at startup).
#[derive(Parser, Debug, Clone)]
#[command(name = "little_lemon", about = "Little Lemon restaurant ordering API")]
pub struct Config {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind: String,

    /// PostgreSQL URL; without it the service runs on seeded in-memory data.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    #[arg(long, env = "DATABASE_CONNECT_ATTEMPTS", default_value_t = 5)]
    pub connect_attempts: u32,
}

impl Config {
    pub fn connect_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.connect_attempts.max(1),
            ..RetryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "little_lemon",
            "--bind",
            "0.0.0.0:9000",
            "--database-url",
            "postgres://localhost/little_lemon",
            "--connect-attempts",
            "0",
        ])
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/little_lemon"));
        assert_eq!(config.connect_retry().max_attempts, 1);
    }
}
