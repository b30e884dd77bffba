//! reviewacquire - product review acquisition through a real browser.
//!
//! Opens each product's review listing in Chrome, narrows it with the
//! star-rating filter, pages through it and writes the reviews of every
//! identifier to its own file.

#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod models;
pub mod scrape;
pub mod session;
pub mod storage;
