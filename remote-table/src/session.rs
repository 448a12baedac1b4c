//! Session-level collaborator for authorization failures.

use crate::error::FetchError;

/// Receives 401/403 failures of current (non-stale) fetches.
///
/// The controller never retries these; re-authentication is the session
/// layer's job.
pub trait SessionGuard: Send + Sync {
    /// Called once per failed fetch with the extracted error.
    fn unauthorized(&self, error: &FetchError);
}

impl<F> SessionGuard for F
where
    F: Fn(&FetchError) + Send + Sync,
{
    fn unauthorized(&self, error: &FetchError) {
        self(error)
    }
}
