//! Background fetch plumbing
//!
//! The stage does not perform I/O itself. It forwards requests to a
//! [`FetchBackend`] and accepts completions either from the backend's
//! [`poll`](FetchBackend::poll) or from the host calling
//! [`Stage::complete_fetch`](crate::Stage::complete_fetch).

use crate::error::FetchError;

/// Result of a finished fetch
pub type FetchOutcome = Result<(), FetchError>;

/// A completion signal for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCompletion {
    pub url: String,
    pub outcome: FetchOutcome,
}

impl FetchCompletion {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(()),
        }
    }

    pub fn failure(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            outcome: Err(error),
        }
    }
}

/// Something that can load assets in the background
pub trait FetchBackend {
    /// Start loading `url`. Must not block.
    fn request(&mut self, url: &str);

    /// Drain completions that arrived since the last poll
    fn poll(&mut self) -> Vec<FetchCompletion> {
        Vec::new()
    }
}
