use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::config::{BrowserConfig, BrowserDriver};
use crate::error::{Error, Result};

/// Something that can render a page and hand back its source.
pub trait PageSource {
    /// Navigates to `url`, waits for it to settle and returns the rendered HTML.
    fn load(&mut self, url: &str) -> Result<String>;
}

/// A single Chrome process with one tab, reused for every page of a crawl.
///
/// The process is terminated when the session is closed or dropped.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
    settle_delay: Duration,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let BrowserDriver::Chrome = config.driver;

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .path(config.executable.clone())
            .idle_browser_timeout(config.idle_timeout)
            .build()
            .map_err(|e| Error::Browser(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| Error::Browser(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| Error::Browser(e.to_string()))?;
        info!(target: "crawl", headless = config.headless, "browser session started");

        Ok(Self {
            browser,
            tab,
            settle_delay: config.settle_delay,
        })
    }

    /// Closes the tab and shuts the browser down.
    pub fn close(self) {
        if let Err(err) = self.tab.close(true) {
            debug!(target: "crawl", error = %err, "tab was already gone");
        }
        drop(self.browser);
        info!(target: "crawl", "browser session closed");
    }
}

impl PageSource for ChromeSession {
    fn load(&mut self, url: &str) -> Result<String> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| Error::Browser(format!("{url}: {e}")))?;

        thread::sleep(self.settle_delay);

        self.tab
            .get_content()
            .map_err(|e| Error::Browser(format!("{url}: {e}")))
    }
}
