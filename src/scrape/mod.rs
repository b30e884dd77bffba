//! Review scraping: field extraction, pagination, retries and the batch runner.

pub mod batch;
mod error;
pub mod extract;
pub mod pager;
pub mod pipeline;
pub mod retry;

pub use batch::{BatchEvent, BatchRunner, BatchSummary, TargetFailure};
pub use error::{FailureKind, PipelineError};
pub use extract::extract_review;
pub use pager::{Pager, PagerState};
pub use pipeline::{IdentifierOutcome, IdentifierPipeline, ScrapeSettings};
pub use retry::{retry_with_policy, RetryExhausted, RetryPolicy};
