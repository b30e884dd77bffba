//! Walks the paginated review listing of one identifier.
//!
//! The pager is a small state machine over an already loaded and filtered
//! listing: each iteration extracts the visible reviews, then (except on the
//! last iteration) moves to the next page. The iteration count is the only
//! loop bound.

use crate::config::{MissingNextPage, ReviewSelectors};
use crate::models::ReviewRecord;
use crate::session::{Locator, PageSession, SessionError};

use super::extract::extract_review;

/// Where the pager is within one identifier's listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// Listing loaded, nothing read yet.
    Loading,
    /// Reading reviews of iteration `n` (0-based).
    Extracting(u32),
    /// Moving on after iteration `n`.
    Advancing(u32),
    Done,
}

/// Pagination settings for one identifier.
#[derive(Debug, Clone)]
pub struct Pager<'a> {
    pub id: &'a str,
    pub pages: u32,
    pub next_page: &'a str,
    pub on_missing: MissingNextPage,
    pub selectors: &'a ReviewSelectors,
}

impl Pager<'_> {
    /// Collect reviews from `pages` iterations, page order then DOM order.
    pub async fn run<S: PageSession>(
        &self,
        session: &mut S,
    ) -> Result<Vec<ReviewRecord>, SessionError> {
        let mut records = Vec::new();
        let mut state = PagerState::Loading;

        loop {
            state = match state {
                PagerState::Loading if self.pages == 0 => PagerState::Done,
                PagerState::Loading => PagerState::Extracting(0),
                PagerState::Extracting(page) => {
                    let fragments = session
                        .query_fragments(&self.selectors.review, &self.selectors.fields())
                        .await?;
                    tracing::debug!(
                        "{}: page {} has {} reviews",
                        self.id,
                        page + 1,
                        fragments.len()
                    );
                    records.extend(
                        fragments
                            .iter()
                            .map(|fragment| extract_review(fragment, self.selectors)),
                    );

                    if page + 1 >= self.pages {
                        PagerState::Done
                    } else {
                        PagerState::Advancing(page)
                    }
                }
                PagerState::Advancing(page) => self.advance(session, page).await?,
                PagerState::Done => break,
            };
        }

        Ok(records)
    }

    async fn advance<S: PageSession>(
        &self,
        session: &mut S,
        page: u32,
    ) -> Result<PagerState, SessionError> {
        let locator = Locator::css(self.next_page);
        match session.wait_for(&locator).await? {
            Some(next) => {
                session.click(&next).await?;
                session.settle().await?;
                Ok(PagerState::Extracting(page + 1))
            }
            None => match self.on_missing {
                MissingNextPage::Repeat => {
                    tracing::warn!(
                        "{}: no next page after page {}, re-reading the current page",
                        self.id,
                        page + 1
                    );
                    Ok(PagerState::Extracting(page + 1))
                }
                MissingNextPage::Stop => {
                    tracing::warn!(
                        "{}: no next page after page {}, stopping",
                        self.id,
                        page + 1
                    );
                    Ok(PagerState::Done)
                }
            },
        }
    }
}
