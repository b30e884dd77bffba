//! Identifier pipeline error types.

use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("'{0}' link not found on the product page")]
    MissingAffordance(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Coarse classification of why an identifier failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NavigationTimeout,
    MissingAffordance,
    OperationTimeout,
    ElementNotFound,
    Browser,
    Script,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingAffordance(_) => FailureKind::MissingAffordance,
            Self::Session(SessionError::NavigationTimeout { .. }) => FailureKind::NavigationTimeout,
            Self::Session(SessionError::Timeout { .. }) => FailureKind::OperationTimeout,
            Self::Session(SessionError::ElementNotFound(_)) => FailureKind::ElementNotFound,
            Self::Session(SessionError::Browser(_)) => FailureKind::Browser,
            Self::Session(SessionError::Script(_)) => FailureKind::Script,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NavigationTimeout => "navigation timeout",
            Self::MissingAffordance => "missing review link",
            Self::OperationTimeout => "timeout",
            Self::ElementNotFound => "element not found",
            Self::Browser => "browser error",
            Self::Script => "script error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_map_to_kinds() {
        let err: PipelineError = SessionError::NavigationTimeout {
            url: "https://example.test/B00TEST1".into(),
            secs: 10,
        }
        .into();
        assert_eq!(err.kind(), FailureKind::NavigationTimeout);
        assert!(err.to_string().contains("10s"));

        let err: PipelineError = SessionError::ElementNotFound("#star-count-dropdown".into()).into();
        assert_eq!(err.kind(), FailureKind::ElementNotFound);

        let err = PipelineError::MissingAffordance("See more reviews".into());
        assert_eq!(err.kind(), FailureKind::MissingAffordance);
        assert_eq!(err.kind().to_string(), "missing review link");
    }
}
