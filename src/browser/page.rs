//! `PageSession` on a chromiumoxide tab.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use tokio::time::Instant;
use tracing::debug;

use crate::session::{FragmentSnapshot, Locator, PageSession, SessionError};

use super::scripts;

/// Delay between element lookups while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One tab in the shared browser.
pub struct ChromePage {
    page: Page,
    operation_timeout: Duration,
    navigation_timeout: Duration,
}

impl ChromePage {
    pub fn new(page: Page, operation_timeout: Duration, navigation_timeout: Duration) -> Self {
        Self {
            page,
            operation_timeout,
            navigation_timeout,
        }
    }

    /// Run a CDP call under the operation timeout.
    async fn within<T, Fut>(&self, operation: &str, fut: Fut) -> Result<T, SessionError>
    where
        Fut: Future<Output = Result<T, CdpError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SessionError::Browser(format!("{}: {}", operation, e))),
            Err(_) => Err(SessionError::Timeout {
                operation: operation.to_string(),
                secs: self.operation_timeout.as_secs(),
            }),
        }
    }

    async fn find_once(&self, locator: &Locator) -> Result<Element, CdpError> {
        match locator {
            Locator::Css(selector) => self.page.find_element(selector.as_str()).await,
            Locator::Text(text) => self.page.find_xpath(scripts::text_xpath(text)).await,
        }
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        script: String,
    ) -> Result<T, SessionError> {
        let result = self.within(operation, self.page.evaluate(script)).await?;
        result
            .into_value()
            .map_err(|e| SessionError::Script(format!("{}: {}", operation, e)))
    }
}

#[async_trait]
impl PageSession for ChromePage {
    type Element = Element;

    async fn set_timeouts(
        &mut self,
        operation: Duration,
        navigation: Duration,
    ) -> Result<(), SessionError> {
        self.operation_timeout = operation;
        self.navigation_timeout = navigation;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| SessionError::Browser(format!("invalid URL {}: {}", url, e)))?;

        let page = &self.page;
        let load = async move {
            page.execute(nav_params).await?;
            page.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        };

        match tokio::time::timeout(self.navigation_timeout, load).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Browser(format!("navigate to {}: {}", url, e))),
            Err(_) => Err(SessionError::NavigationTimeout {
                url: url.to_string(),
                secs: self.navigation_timeout.as_secs(),
            }),
        }
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, SessionError> {
        let deadline = Instant::now() + self.operation_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Ok(Ok(element)) = tokio::time::timeout(remaining, self.find_once(locator)).await
            {
                return Ok(Some(element));
            }
            if Instant::now() + POLL_INTERVAL >= deadline {
                debug!("No element for '{}' within {:?}", locator, self.operation_timeout);
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, element: &Self::Element) -> Result<(), SessionError> {
        self.within("click", element.click()).await?;
        Ok(())
    }

    async fn settle(&mut self) -> Result<(), SessionError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.wait_for_navigation()).await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Browser(format!("wait for navigation: {}", e))),
            Err(_) => {
                let url = self.page.url().await.ok().flatten().unwrap_or_default();
                Err(SessionError::NavigationTimeout {
                    url,
                    secs: self.navigation_timeout.as_secs(),
                })
            }
        }
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<(), SessionError> {
        let found: bool = self
            .evaluate("select option", scripts::select_option(selector, value))
            .await?;
        if found {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(selector.to_string()))
        }
    }

    async fn query_fragments(
        &mut self,
        selector: &str,
        fields: &[&str],
    ) -> Result<Vec<FragmentSnapshot>, SessionError> {
        self.evaluate("query reviews", scripts::query_fragments(selector, fields))
            .await
    }

    async fn close(self) -> Result<(), SessionError> {
        self.page
            .close()
            .await
            .map_err(|e| SessionError::Browser(format!("close page: {}", e)))
    }
}
