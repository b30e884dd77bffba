//! Per-identifier scrape: open the listing, filter it, page through it.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ReviewPageConfig, Settings};
use crate::models::{IdentifierTarget, ReviewRecord};
use crate::session::{Locator, PageSession, SessionFactory};

use super::error::{FailureKind, PipelineError};
use super::pager::Pager;
use super::retry::{retry_with_policy, RetryPolicy};

/// Everything an identifier pipeline needs besides the browser.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Listing pages walked unless the target overrides it.
    pub pages: u32,
    pub operation_timeout: Duration,
    pub navigation_timeout: Duration,
    pub retry: RetryPolicy,
    pub reviews: ReviewPageConfig,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            pages: crate::config::DEFAULT_PAGES,
            operation_timeout: Duration::from_secs(crate::config::browser::default_timeout()),
            navigation_timeout: Duration::from_secs(crate::config::browser::default_timeout()),
            retry: RetryPolicy::default(),
            reviews: ReviewPageConfig::default(),
        }
    }
}

impl ScrapeSettings {
    pub fn from_config(config: &Config, settings: &Settings) -> Self {
        Self {
            pages: settings.pages,
            operation_timeout: config.browser.operation_timeout(),
            navigation_timeout: config.browser.navigation_timeout(),
            retry: config.retry.to_policy(),
            reviews: config.reviews.clone(),
        }
    }
}

/// Result of scraping one identifier, after retries.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierOutcome {
    Completed {
        records: Vec<ReviewRecord>,
        attempts: u32,
    },
    Failed {
        kind: FailureKind,
        attempts: u32,
        error: String,
    },
}

impl IdentifierOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Scrapes single identifiers with sessions from a shared factory.
pub struct IdentifierPipeline<F: SessionFactory> {
    factory: Arc<F>,
    settings: Arc<ScrapeSettings>,
}

impl<F: SessionFactory> Clone for IdentifierPipeline<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<F: SessionFactory> IdentifierPipeline<F> {
    pub fn new(factory: Arc<F>, settings: Arc<ScrapeSettings>) -> Self {
        Self { factory, settings }
    }

    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    /// Scrape one identifier, retrying the whole sequence on any failure.
    pub async fn run(&self, target: &IdentifierTarget) -> IdentifierOutcome {
        let pages = target.pages_or(self.settings.pages);
        let result = retry_with_policy(&self.settings.retry, &target.id, |attempt| {
            tracing::debug!("{}: attempt {}", target.id, attempt);
            self.attempt(&target.id, pages)
        })
        .await;

        match result {
            Ok((records, attempts)) => {
                tracing::info!(
                    "{}: {} reviews after {} attempt(s)",
                    target.id,
                    records.len(),
                    attempts
                );
                IdentifierOutcome::Completed { records, attempts }
            }
            Err(exhausted) => {
                tracing::error!(
                    "{}: giving up after {} attempts: {}",
                    target.id,
                    exhausted.attempts,
                    exhausted.last_error
                );
                IdentifierOutcome::Failed {
                    kind: exhausted.last_error.kind(),
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }

    /// One attempt on a fresh session. The session is closed either way.
    pub async fn attempt(&self, id: &str, pages: u32) -> Result<Vec<ReviewRecord>, PipelineError> {
        let mut session = self.factory.open().await?;
        let result = self.drive(&mut session, id, pages).await;
        if let Err(e) = session.close().await {
            tracing::debug!("{}: failed to close page: {}", id, e);
        }
        result
    }

    async fn drive(
        &self,
        session: &mut F::Session,
        id: &str,
        pages: u32,
    ) -> Result<Vec<ReviewRecord>, PipelineError> {
        let reviews = &self.settings.reviews;

        session
            .set_timeouts(self.settings.operation_timeout, self.settings.navigation_timeout)
            .await?;

        let url = reviews.listing_url_for(id);
        tracing::debug!("{}: navigating to {}", id, url);
        session.navigate(&url).await?;

        let see_more = session
            .wait_for(&Locator::text(reviews.see_more_text.as_str()))
            .await?
            .ok_or_else(|| PipelineError::MissingAffordance(reviews.see_more_text.clone()))?;
        session.click(&see_more).await?;
        session.settle().await?;

        session
            .select_option(&reviews.star_filter_select, &reviews.star_filter_value)
            .await?;

        let pager = Pager {
            id,
            pages,
            next_page: &reviews.next_page,
            on_missing: reviews.on_missing_next_page,
            selectors: &reviews.selectors,
        };
        Ok(pager.run(session).await?)
    }
}
