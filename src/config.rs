use crate::storage::resolve_data_path;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MOCK_PORT: u16 = 8081;

/// Runtime settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub use_mock_backend: bool,
    pub mock_delay: Duration,
}

impl Config {
    pub fn from_env(default_port: u16) -> Self {
        Self {
            port: env_parse("PORT").unwrap_or(default_port),
            data_path: resolve_data_path(),
            api_base_url: env::var("API_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_timeout: Duration::from_secs(env_parse("API_TIMEOUT_SECS").unwrap_or(30)),
            use_mock_backend: env::var("USE_MOCK_BACKEND")
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
            mock_delay: Duration::from_millis(env_parse("MOCK_DELAY_MS").unwrap_or(0)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
