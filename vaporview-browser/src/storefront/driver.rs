use crate::storefront::page::StorePage;
use anyhow::Result;
use fantoccini::ClientBuilder;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;
use vaporview_common::BrowserConfig;
use webdriver::capabilities::Capabilities;

/// Thin wrapper around a `fantoccini` WebDriver client, configured for a
/// single scrape session against the storefront.
pub struct StoreDriver {
    pub client: fantoccini::Client,
}

impl StoreDriver {
    /// Connect to the configured WebDriver service and start a Chrome
    /// session sized for the storefront's desktop layout.
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();

        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if config.headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        }
        chrome_opts.insert("args".to_string(), json!(args));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        debug!(
            target: "browser.driver",
            webdriver_url = %config.webdriver_url,
            headless = config.headless,
            "connecting WebDriver session"
        );
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await?;

        Ok(Self { client })
    }

    /// Navigate to `url` and return a [`StorePage`] for further interaction.
    pub async fn goto(&self, url: &str) -> Result<StorePage> {
        self.client.goto(url).await?;
        Ok(StorePage::new(self.client.clone()))
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
