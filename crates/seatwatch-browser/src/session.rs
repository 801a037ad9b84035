use crate::{Error, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::EnableParams;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A live DevTools connection to an already-running Chrome.
///
/// Owns the browser handle (dropping it tears down the websocket) and the
/// background task that pumps protocol messages; page commands stall without
/// that task running.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Connect to the debugging port and take over the first page. Chrome
    /// needs a moment to open the port after spawning, so the connection is
    /// retried before giving up.
    pub async fn connect(debugging_port: u16) -> Result<Self> {
        let ws_url = format!("http://localhost:{}", debugging_port);
        let (browser, mut handler) = {
            let mut retries = 5;
            loop {
                tracing::debug!("Attempting CDP connection to {}...", ws_url);
                match Browser::connect(&ws_url).await {
                    Ok(result) => {
                        tracing::info!("CDP connection established");
                        break result;
                    }
                    Err(e) => {
                        retries -= 1;
                        if retries == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to Chrome after 5 attempts: {}",
                                e
                            )));
                        }
                        tracing::info!("CDP connection attempt failed, retrying... ({} left)", retries);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
        };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // Some protocol events fail to parse; the session survives.
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        // Give Chrome time to create its initial page before listing.
        tokio::time::sleep(Duration::from_millis(500)).await;

        let page = if let Some(page) = browser.pages().await?.first() {
            tracing::debug!("Using Chrome's existing page");
            page.clone()
        } else {
            tracing::debug!("No existing pages, creating one");
            browser.new_page("about:blank").await?
        };

        // Network events back the quiescence and response waits.
        page.execute(EnableParams::default()).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Detach from Chrome. The process itself is the caller's to stop.
    pub async fn shutdown(self) {
        self.handler_task.abort();
        drop(self.browser);
    }
}

// Session behavior against a live Chrome is covered by the CLI integration
// tests; everything here needs a real debugging port.
