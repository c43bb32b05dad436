use async_trait::async_trait;
use thiserror::Error;

use crate::types::WindowHandle;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("no such window: {0}")]
    NoSuchWindow(WindowHandle),
    #[error("browser driver error: {0}")]
    Driver(String),
}

/// How an element on the page is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Element `id` attribute.
    Id(String),
    Css(String),
    /// Anchor whose visible text equals the value.
    LinkText(String),
    /// Any rendered text containing the value.
    Text(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::LinkText(text) => write!(f, "link '{}'", text),
            Locator::Text(text) => write!(f, "text '{}'", text),
        }
    }
}

/// The browser capabilities the conversion automator relies on.
///
/// Every call acts on the currently focused window. Implementations are
/// driven strictly sequentially by a single owner.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn reload(&mut self) -> Result<(), BrowserError>;

    async fn is_present(&mut self, locator: &Locator) -> Result<bool, BrowserError>;

    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError>;

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    async fn current_window(&mut self) -> Result<WindowHandle, BrowserError>;

    async fn list_windows(&mut self) -> Result<Vec<WindowHandle>, BrowserError>;

    async fn close_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError>;

    async fn switch_window(&mut self, handle: &WindowHandle) -> Result<(), BrowserError>;

    /// Tears the session down. No other call is valid afterwards.
    async fn shutdown(&mut self) -> Result<(), BrowserError>;
}
