use std::{env, path::PathBuf, str::FromStr, time::Duration};

use super::env::{
    AppConfig, BrowserConfig, BrowserDriver, ConfigError, CrawlConfig, HttpConfig, LoggingConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let http = HttpConfig {
            timeout: Duration::from_secs(
                parse_var("HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.http.timeout.as_secs()),
            ),
            user_agent: env::var("HTTP_USER_AGENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.http.user_agent),
        };

        let crawl = CrawlConfig {
            sample_threshold: parse_var("CRAWL_SAMPLE_THRESHOLD")?
                .unwrap_or(defaults.crawl.sample_threshold),
            sample_divisor: parse_var::<usize>("CRAWL_SAMPLE_DIVISOR")?
                .filter(|divisor| *divisor > 0)
                .unwrap_or(defaults.crawl.sample_divisor),
            sample_cap: parse_var("CRAWL_SAMPLE_CAP")?.unwrap_or(defaults.crawl.sample_cap),
        };

        let driver = match env::var("BROWSER_DRIVER") {
            Ok(value) if !value.trim().is_empty() => value.parse::<BrowserDriver>()?,
            _ => defaults.browser.driver,
        };

        let browser = BrowserConfig {
            driver,
            executable: env::var("BROWSER_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            headless: parse_var("BROWSER_HEADLESS")?.unwrap_or(defaults.browser.headless),
            settle_delay: parse_var("SETTLE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.browser.settle_delay),
            idle_timeout: parse_var("BROWSER_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.browser.idle_timeout),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or(defaults.logging.level),
        };

        Ok(Self {
            http,
            crawl,
            browser,
            logging,
        })
    }
}

/// Reads `key` and parses it, treating unset or empty variables as absent.
fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}
