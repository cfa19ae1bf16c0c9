use crate::errors::{NewsflowError, NewsflowResult};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_FETCH_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address `serve` binds to.
    pub bind_addr: String,
    /// Seconds between background refresh rounds in `serve`.
    pub fetch_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> NewsflowResult<Self> {
        dotenvy::dotenv().ok();

        let bind_addr =
            std::env::var("NEWSFLOW_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let fetch_interval_secs = match std::env::var("NEWSFLOW_FETCH_INTERVAL") {
            Ok(raw) => raw.parse().map_err(|_| {
                NewsflowError::Config(format!(
                    "NEWSFLOW_FETCH_INTERVAL must be a number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_FETCH_INTERVAL_SECS,
        };

        Ok(Self {
            bind_addr,
            fetch_interval_secs,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            fetch_interval_secs: DEFAULT_FETCH_INTERVAL_SECS,
        }
    }
}
