//! Page rendering
//!
//! SourceForge and generic pages are fetched through a [`PageRenderer`].
//! With the `browser` feature a headless Chromium executes the page's
//! JavaScript; without it the raw HTML is fetched over HTTP.

use crate::error::EnrichError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Produces the HTML of a page
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Fetch (and render, if supported) `url`, returning its HTML
    async fn render(&self, url: &str) -> Result<String, EnrichError>;
}

/// Plain HTTP fetch; scripts are not executed
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    /// Create a renderer with its own client
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Create a renderer sharing an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String, EnrichError> {
        debug!("Fetching {} over HTTP (JavaScript not executed)", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumRenderer;

#[cfg(feature = "browser")]
mod chromium {
    use super::PageRenderer;
    use crate::error::EnrichError;
    use async_trait::async_trait;
    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tokio::task::JoinHandle;
    use tracing::{debug, warn};

    /// Headless Chromium renderer
    ///
    /// One browser process serves every render; each render opens and
    /// closes its own tab.
    pub struct ChromiumRenderer {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl ChromiumRenderer {
        /// Launch a headless browser
        pub async fn launch() -> Result<Self, EnrichError> {
            let config = BrowserConfig::builder()
                .args(vec![
                    "--proxy-bypass-list=<-loopback>",
                    "--dns-prefetch-disable",
                ])
                .build()
                .map_err(EnrichError::Render)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| EnrichError::Render(format!("Failed to launch browser: {}", e)))?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
                warn!("Chromium event loop exited");
            });

            Ok(Self { browser, handler })
        }
    }

    #[async_trait]
    impl PageRenderer for ChromiumRenderer {
        async fn render(&self, url: &str) -> Result<String, EnrichError> {
            debug!("Rendering {} in Chromium", url);
            let page = self
                .browser
                .new_page(url)
                .await
                .map_err(|e| EnrichError::Render(format!("Failed to open {}: {}", url, e)))?;

            let content = match page.wait_for_navigation().await {
                Ok(page) => page.content().await,
                Err(e) => Err(e),
            };

            if let Err(e) = page.close().await {
                debug!("Failed to close tab for {}: {}", url, e);
            }

            content.map_err(|e| EnrichError::Render(format!("Failed to render {}: {}", url, e)))
        }
    }

    impl Drop for ChromiumRenderer {
        fn drop(&mut self) {
            self.handler.abort();
        }
    }
}
