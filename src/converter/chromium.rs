use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::{
    Browser, BrowserConfig, Element, Page,
    cdp::browser_protocol::browser::{SetDownloadBehaviorBehavior, SetDownloadBehaviorParams},
    error::CdpError,
};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::{
    converter::browser::{BrowserError, BrowserSession, Locator},
    types::WindowHandle,
};

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        BrowserError::Driver(err.to_string())
    }
}

/// [`BrowserSession`] backed by a Chromium instance over the DevTools
/// protocol. Every tab or popup the browser opens is a window.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    current: Page,
}

/// Browser-wide download settings saving every file into `dir`.
pub fn download_behavior(dir: &Path) -> Result<SetDownloadBehaviorParams, BrowserError> {
    SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(dir.to_string_lossy())
        .build()
        .map_err(BrowserError::Driver)
}

impl ChromiumSession {
    /// Launches Chromium (headless unless `headed`) with popups and
    /// notifications allowed through, and opens the home tab.
    ///
    /// Downloads land in `download_dir`, which is created if missing.
    pub async fn launch(headed: bool, download_dir: &Path) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-popup-blocking")
            .arg("--disable-notifications");
        if headed {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Driver)?;

        async_fs::create_dir_all(download_dir)
            .await
            .map_err(|e| BrowserError::Driver(e.to_string()))?;
        let download_dir = async_fs::canonicalize(download_dir)
            .await
            .map_err(|e| BrowserError::Driver(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        browser.execute(download_behavior(&download_dir)?).await?;
        let current = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            handler,
            current,
        })
    }

    fn handle_of(page: &Page) -> WindowHandle {
        WindowHandle::new(page.target_id().inner().clone())
    }

    async fn page_for(&self, handle: &WindowHandle) -> Result<Page, BrowserError> {
        self.browser
            .pages()
            .await?
            .into_iter()
            .find(|page| &Self::handle_of(page) == handle)
            .ok_or_else(|| BrowserError::NoSuchWindow(handle.clone()))
    }

    async fn first_css(&self, selector: &str) -> Result<Option<Element>, BrowserError> {
        Ok(self.current.find_elements(selector).await?.into_iter().next())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<Element>, BrowserError> {
        match locator {
            Locator::Id(id) => self.first_css(&format!("#{}", id)).await,
            Locator::Css(selector) => self.first_css(selector).await,
            Locator::LinkText(text) => {
                for anchor in self.current.find_elements("a").await? {
                    let visible = anchor.inner_text().await?.unwrap_or_default();
                    if visible.trim() == text {
                        return Ok(Some(anchor));
                    }
                }
                Ok(None)
            }
            Locator::Text(text) => {
                for div in self.current.find_elements("div").await? {
                    let visible = div.inner_text().await?.unwrap_or_default();
                    if visible.contains(text.as_str()) {
                        return Ok(Some(div));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn require(&self, locator: &Locator) -> Result<Element, BrowserError> {
        self.find(locator)
            .await?
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.current.goto(url).await?;
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), BrowserError> {
        self.current.reload().await?;
        Ok(())
    }

    async fn is_present(&mut self, locator: &Locator) -> Result<bool, BrowserError> {
        Ok(self.find(locator).await?.is_some())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        self.require(locator).await?.click().await?;
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        let element = self.require(locator).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn current_window(&mut self) -> Result<WindowHandle, BrowserError> {
        Ok(Self::handle_of(&self.current))
    }

    async fn list_windows(&mut self) -> Result<Vec<WindowHandle>, BrowserError> {
        Ok(self.browser.pages().await?.iter().map(Self::handle_of).collect())
    }

    async fn close_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError> {
        self.page_for(handle).await?.close().await?;
        Ok(())
    }

    async fn switch_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError> {
        let page = self.page_for(handle).await?;
        page.bring_to_front().await?;
        self.current = page;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        self.browser
            .wait()
            .await
            .map_err(|e| BrowserError::Driver(e.to_string()))?;
        self.handler.abort();
        Ok(())
    }
}
