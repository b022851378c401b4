//! Request-scoped context carried by every session handle.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use ks_domain::error::{Error, Result};

/// Caller-supplied request context.
///
/// The registry and [`Session::save`](crate::Session::save) check it before
/// opening a store transaction; a transaction that has already started
/// always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    request_id: Option<String>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Tie this context to an existing cancellation token (usually the one
    /// owned by the HTTP request).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err` if the request was cancelled or its deadline has passed.
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
