//! Scripted in-memory page sessions for pipeline and batch tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use reviewacquire::config::{ReviewPageConfig, ReviewSelectors};
use reviewacquire::scrape::{RetryPolicy, ScrapeSettings};
use reviewacquire::session::{FragmentSnapshot, Locator, PageSession, SessionError, SessionFactory};

pub const LISTING_URL: &str = "https://example.test/{id}";

/// One review fragment keyed by the default selectors.
pub fn review(author: &str, title: &str, body: &str) -> FragmentSnapshot {
    let selectors = ReviewSelectors::default();
    FragmentSnapshot::new()
        .with(&selectors.author, format!("\n{}\n", author))
        .with(&selectors.title, format!("5.0 out of 5 stars\n{}", title))
        .with(&selectors.rating, "5.0 out of 5 stars")
        .with(&selectors.date, "January 1 2024")
        .with(&selectors.body, format!(" {} ", body))
}

/// A product listing as the fake browser serves it.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Reviews per listing page; a next-page control exists on every page but the last.
    pub pages: Vec<Vec<FragmentSnapshot>>,
    /// Whether the product page shows the "See more reviews" link.
    pub has_see_more: bool,
}

impl Listing {
    pub fn new(pages: Vec<Vec<FragmentSnapshot>>) -> Self {
        Self {
            pages,
            has_see_more: true,
        }
    }

    pub fn without_see_more(mut self) -> Self {
        self.has_see_more = false;
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub listings: HashMap<String, Listing>,
    /// Remaining navigations that time out, per identifier.
    pub failures: HashMap<String, u32>,
    pub opened: usize,
    pub closed: usize,
    pub shutdowns: usize,
    pub filters: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, id: &str, listing: Listing) -> Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .insert(id.to_string(), listing);
        self
    }

    /// Make the next `count` navigations for `id` time out.
    pub fn failing(self, id: &str, count: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(id.to_string(), count);
        self
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn shutdowns(&self) -> usize {
        self.state.lock().unwrap().shutdowns
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeElement {
    SeeMore,
    NextPage,
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    listing: Option<Listing>,
    page: usize,
}

impl FakeSession {
    fn listing(&self) -> Result<&Listing, SessionError> {
        self.listing
            .as_ref()
            .ok_or_else(|| SessionError::Browser("no page loaded".into()))
    }
}

#[async_trait]
impl PageSession for FakeSession {
    type Element = FakeElement;

    async fn set_timeouts(
        &mut self,
        _operation: Duration,
        _navigation: Duration,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let id = url.rsplit('/').next().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();

        if let Some(remaining) = state.failures.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SessionError::NavigationTimeout {
                    url: url.to_string(),
                    secs: 10,
                });
            }
        }

        match state.listings.get(&id) {
            Some(listing) => {
                self.listing = Some(listing.clone());
                self.page = 0;
                Ok(())
            }
            None => Err(SessionError::NavigationTimeout {
                url: url.to_string(),
                secs: 10,
            }),
        }
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, SessionError> {
        let listing = self.listing()?;
        Ok(match locator {
            Locator::Text(_) if listing.has_see_more => Some(FakeElement::SeeMore),
            Locator::Css(_) if self.page + 1 < listing.pages.len() => {
                Some(FakeElement::NextPage)
            }
            _ => None,
        })
    }

    async fn click(&mut self, element: &Self::Element) -> Result<(), SessionError> {
        if *element == FakeElement::NextPage {
            self.page += 1;
        }
        Ok(())
    }

    async fn settle(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<(), SessionError> {
        self.state
            .lock()
            .unwrap()
            .filters
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn query_fragments(
        &mut self,
        _selector: &str,
        _fields: &[&str],
    ) -> Result<Vec<FragmentSnapshot>, SessionError> {
        let listing = self.listing()?;
        Ok(listing.pages.get(self.page).cloned().unwrap_or_default())
    }

    async fn close(self) -> Result<(), SessionError> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for FakeBrowser {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession, SessionError> {
        self.state.lock().unwrap().opened += 1;
        Ok(FakeSession {
            state: self.state.clone(),
            listing: None,
            page: 0,
        })
    }

    async fn shutdown(&self) {
        self.state.lock().unwrap().shutdowns += 1;
    }
}

/// Settings pointing at the fake storefront, retrying immediately.
pub fn settings(pages: u32, retries: u32) -> ScrapeSettings {
    ScrapeSettings {
        pages,
        retry: RetryPolicy::immediate(retries),
        reviews: ReviewPageConfig {
            listing_url: LISTING_URL.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}
