use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub crawl: CrawlConfig,
    pub browser: BrowserConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            user_agent: format!("site-categorizer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Sampling rule for internal links: below `sample_threshold` links, one
/// `sample_divisor`-th of them is visited, above it a flat `sample_cap`.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub sample_threshold: usize,
    pub sample_divisor: usize,
    pub sample_cap: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            sample_threshold: 200,
            sample_divisor: 4,
            sample_cap: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserDriver {
    Chrome,
}

impl FromStr for BrowserDriver {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            _ => Err(ConfigError::UnsupportedDriver(value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub driver: BrowserDriver,
    /// Browser executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub settle_delay: Duration,
    pub idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            driver: BrowserDriver::Chrome,
            executable: None,
            headless: true,
            settle_delay: Duration::from_millis(1500),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for environment variable {key}")]
    Invalid { key: &'static str, value: String },

    #[error("unsupported browser driver `{0}` (expected `chrome`)")]
    UnsupportedDriver(String),
}
