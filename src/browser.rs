use crate::error::ScraperError;
use scraper::Html;
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, warn};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A rendered page as the browser saw it after any redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

/// Host part of an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(ToString::to_string))
}

impl Page {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

#[async_trait::async_trait]
pub trait Browser: Send {
    /// Navigates to `url` and waits until an element matching `ready` exists.
    async fn open(&mut self, url: &str, ready: &str) -> Result<Page, ScraperError>;

    /// Where the last navigation actually landed, ready or not.
    async fn current_url(&mut self) -> Result<String, ScraperError>;

    async fn close(&mut self) -> Result<(), ScraperError>;
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions {
            webdriver_url: "http://localhost:9515".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Headless Chrome driven through a running ChromeDriver.
pub struct WebDriverBrowser {
    driver: Option<WebDriver>,
    timeout: Duration,
}

impl WebDriverBrowser {
    pub async fn launch(options: &BrowserOptions) -> Result<WebDriverBrowser, ScraperError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option(
            "args",
            vec![
                "--headless=new",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--log-level=3",
                "--window-size=1920,1080",
            ],
        )?;

        debug!("Connecting to WebDriver at {}", options.webdriver_url);
        let driver = WebDriver::new(&options.webdriver_url, caps).await?;
        Ok(WebDriverBrowser {
            driver: Some(driver),
            timeout: options.timeout,
        })
    }

    fn driver(&self) -> Result<&WebDriver, ScraperError> {
        self.driver
            .as_ref()
            .ok_or(ScraperError::SessionClosed)
    }

    fn not_ready(&self, url: &str, ready: &str) -> ScraperError {
        ScraperError::PageNotReady {
            url: url.to_string(),
            selector: ready.to_string(),
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait::async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&mut self, url: &str, ready: &str) -> Result<Page, ScraperError> {
        let driver = self.driver()?;

        debug!("Visit {}", url);
        tokio::time::timeout(self.timeout, driver.goto(url))
            .await
            .map_err(|_| self.not_ready(url, ready))??;

        driver
            .query(By::Css(ready))
            .wait(self.timeout, POLL_INTERVAL)
            .first()
            .await
            .map_err(|_| self.not_ready(url, ready))?;

        let html = driver.source().await?;
        let url = driver.current_url().await?.to_string();
        Ok(Page { url, html })
    }

    async fn current_url(&mut self) -> Result<String, ScraperError> {
        Ok(self.driver()?.current_url().await?.to_string())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
        }
        Ok(())
    }
}

impl Drop for WebDriverBrowser {
    fn drop(&mut self) {
        if self.driver.is_some() {
            warn!("Browser session dropped without being closed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::parse_selector;
    use std::collections::HashMap;

    /// Serves canned pages, keyed by the requested URL.
    #[derive(Debug, Default)]
    pub(crate) struct StaticBrowser {
        pages: HashMap<String, Page>,
        current: Option<String>,
        pub visited: Vec<String>,
        pub closed: bool,
    }

    impl StaticBrowser {
        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    url: url.to_string(),
                    html: html.to_string(),
                },
            );
            self
        }

        pub fn with_redirect(mut self, url: &str, landing_url: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    url: landing_url.to_string(),
                    html: html.to_string(),
                },
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl Browser for StaticBrowser {
        async fn open(&mut self, url: &str, ready: &str) -> Result<Page, ScraperError> {
            self.visited.push(url.to_string());
            let not_ready = || ScraperError::PageNotReady {
                url: url.to_string(),
                selector: ready.to_string(),
                timeout_secs: 0,
            };
            let landing = self.pages.get(url).map(|page| page.url.clone());
            self.current = Some(landing.unwrap_or_else(|| url.to_string()));
            let page = self.pages.get(url).cloned().ok_or_else(not_ready)?;
            let selector = parse_selector(ready)?;
            if page.document().select(&selector).next().is_none() {
                return Err(not_ready());
            }
            Ok(page)
        }

        async fn current_url(&mut self) -> Result<String, ScraperError> {
            Ok(self
                .current
                .clone()
                .unwrap_or_else(|| "about:blank".to_string()))
        }

        async fn close(&mut self) -> Result<(), ScraperError> {
            self.closed = true;
            Ok(())
        }
    }
}
