use std::env;
use std::time::Duration;

use serde_json::Value;

use crate::errors::{BotError, BotResult};

/// Default retention for stored links (24 hours)
const DEFAULT_RETENTION_SECS: i64 = 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HEALTH_PORT: u16 = 8080;

/// When the expiry sweeper runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Fixed interval timer, independent of traffic
    Interval,
    /// Opportunistically after every successful link creation
    AfterCreate,
}

/// Runtime configuration, read from the environment once at startup.
/// Missing required variables are fatal; the process exits before
/// connecting to anything.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    /// REST `auth` parameter extracted from the credentials blob, if any
    pub database_secret: Option<String>,
    pub rebrandly_api_key: String,
    pub retention_secs: i64,
    pub sweep_policy: SweepPolicy,
    pub sweep_interval: Duration,
    pub upstream_timeout: Duration,
    pub health_port: u16,
    /// Reply with the raw direct URL when the shortener fails
    pub shorten_fallback: bool,
}

impl Config {
    pub fn from_env() -> BotResult<Self> {
        let bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let database_url = require("FIREBASE_DB_URL")?;
        let rebrandly_api_key = require("REBRANDLY_API_KEY")?;

        let credentials = require("FIREBASE_CREDENTIALS")?;
        let database_secret = parse_credentials(&credentials)?;

        let retention_secs = parse_or("LINK_RETENTION_SECS", DEFAULT_RETENTION_SECS)?;
        if retention_secs <= 0 {
            return Err(BotError::config_error(
                "LINK_RETENTION_SECS must be positive",
            ));
        }

        let sweep_policy = match env::var("SWEEP_POLICY") {
            Ok(v) if v == "after-create" => SweepPolicy::AfterCreate,
            Ok(v) if v == "interval" => SweepPolicy::Interval,
            Ok(v) => {
                return Err(BotError::config_error(format!(
                    "SWEEP_POLICY must be 'interval' or 'after-create', got '{}'",
                    v
                )));
            }
            Err(_) => SweepPolicy::Interval,
        };

        let sweep_interval =
            Duration::from_secs(parse_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?);
        let upstream_timeout = Duration::from_secs(parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?);
        let health_port = parse_or("HEALTH_PORT", DEFAULT_HEALTH_PORT)?;
        let shorten_fallback = parse_or("SHORTEN_FALLBACK", true)?;

        Ok(Self {
            bot_token,
            database_url,
            database_secret,
            rebrandly_api_key,
            retention_secs,
            sweep_policy,
            sweep_interval,
            upstream_timeout,
            health_port,
            shorten_fallback,
        })
    }
}

fn require(name: &str) -> BotResult<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BotError::config_error(format!(
            "{} environment variable not set",
            name
        ))),
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> BotResult<T> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| BotError::config_error(format!("{} has invalid value '{}'", name, v))),
        Err(_) => Ok(default),
    }
}

/// The credentials blob must at least be a JSON object; an optional
/// `database_secret` field is forwarded as the REST auth parameter.
fn parse_credentials(blob: &str) -> BotResult<Option<String>> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| BotError::config_error(format!("FIREBASE_CREDENTIALS is not valid JSON: {}", e)))?;

    let obj = value
        .as_object()
        .ok_or_else(|| BotError::config_error("FIREBASE_CREDENTIALS must be a JSON object"))?;

    Ok(obj
        .get("database_secret")
        .and_then(Value::as_str)
        .map(str::to_owned))
}
