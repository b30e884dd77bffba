//! Page session error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Navigation timed out after {secs}s for {url}")]
    NavigationTimeout { url: String, secs: u64 },
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
    #[error("No element matches '{0}'")]
    ElementNotFound(String),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Page script failed: {0}")]
    Script(String),
}
