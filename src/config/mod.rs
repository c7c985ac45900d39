pub mod env;
mod loader;

pub use env::{
    AppConfig, BrowserConfig, BrowserDriver, ConfigError, CrawlConfig, HttpConfig, LoggingConfig,
};
pub use loader::load_config;
