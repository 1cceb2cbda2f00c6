use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("malformed tour: {0}")]
    MalformedTour(String),
    #[error("no image named '{target}' in this tour")]
    TargetNotFound { target: String },
}

impl NavigationError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTour(message.into())
    }
}
