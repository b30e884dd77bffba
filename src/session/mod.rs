//! Page session capability consumed by the review pipeline.
//!
//! A `PageSession` is one browser tab owned by exactly one pipeline attempt.
//! The listing page, the active filter and the pagination position all live
//! inside the session; every change to them goes through an explicit call on
//! the handle. The Chrome implementation lives in `crate::browser`, tests use
//! scripted in-memory sessions.

mod error;

pub use error::SessionError;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector.
    Css(String),
    /// Any element whose own text contains this string.
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "{}", selector),
            Self::Text(text) => write!(f, "text/{}", text),
        }
    }
}

/// Read access to the sub-elements of one repeated page fragment.
pub trait Fragment {
    /// Raw text content of the first descendant matching `selector`,
    /// or `None` when no descendant matches.
    fn text_content(&self, selector: &str) -> Option<&str>;
}

/// Plain-data copy of one fragment, captured inside the page.
///
/// Holds the raw `textContent` of every requested sub-selector that matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentSnapshot {
    texts: BTreeMap<String, String>,
}

impl FragmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(selector.into(), text.into());
        self
    }
}

impl Fragment for FragmentSnapshot {
    fn text_content(&self, selector: &str) -> Option<&str> {
        self.texts.get(selector).map(String::as_str)
    }
}

/// One browsing context (tab) in the shared browser.
#[async_trait]
pub trait PageSession: Send {
    /// Handle to an element located on the current page.
    type Element: Send + Sync;

    /// Limits applied to every later wait/query (`operation`) and page load (`navigation`).
    async fn set_timeouts(
        &mut self,
        operation: Duration,
        navigation: Duration,
    ) -> Result<(), SessionError>;

    /// Load `url` and wait for it to finish loading.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Wait up to the operation timeout for an element.
    ///
    /// Returns `Ok(None)` when nothing matched in time; errors are reserved
    /// for a broken session.
    async fn wait_for(&mut self, locator: &Locator)
        -> Result<Option<Self::Element>, SessionError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), SessionError>;

    /// Wait for a navigation started by the previous action to settle.
    async fn settle(&mut self) -> Result<(), SessionError>;

    /// Choose `value` in the `<select>` matching `selector`.
    async fn select_option(&mut self, selector: &str, value: &str) -> Result<(), SessionError>;

    /// Snapshot every element matching `selector`, in document order,
    /// reading the text of each of `fields` inside it.
    async fn query_fragments(
        &mut self,
        selector: &str,
        fields: &[&str],
    ) -> Result<Vec<FragmentSnapshot>, SessionError>;

    async fn close(self) -> Result<(), SessionError>;
}

/// Opens fresh sessions on a shared browser.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: PageSession + 'static;

    async fn open(&self) -> Result<Self::Session, SessionError>;

    /// Tear down the browser once no session is in use.
    async fn shutdown(&self);
}
