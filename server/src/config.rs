use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub struct Settings {
    pub discord_token: String,
    pub ranked_api_url: String,
    pub bind_addr: SocketAddr,
    pub report_channels_db: String,
    pub http_timeout: Duration,
    pub shutdown_grace: Duration,
    pub leaderboard_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN")
            .or_else(|| lookup("TOKEN"))
            .filter(|token| !token.trim().is_empty());
        let Some(discord_token) = discord_token else {
            bail!("DISCORD_TOKEN is not set");
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("BIND_ADDR {bind_addr:?} is not a socket address"))?;

        Ok(Self {
            discord_token,
            ranked_api_url: lookup("RANKED_API_URL").unwrap_or_else(|| "http://127.0.0.1:2221".to_string()),
            bind_addr,
            report_channels_db: lookup("REPORT_CHANNELS_DB").unwrap_or_else(|| "report_channels.db".to_string()),
            http_timeout: seconds(&lookup, "HTTP_TIMEOUT_SECS", 10)?,
            shutdown_grace: seconds(&lookup, "SHUTDOWN_GRACE_SECS", 30)?,
            leaderboard_ttl: seconds(&lookup, "LEADERBOARD_TTL_SECS", 60 * 60)?,
        })
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration> {
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs(default));
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
