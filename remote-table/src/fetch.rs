//! Fetch state and its transitions.
//!
//! [`FetchState`] is a plain reducer: [`FetchState::begin`] issues a token,
//! [`FetchState::resolve`] applies a result only if its token is still the
//! latest. Scheduling lives in the controller; ordering lives here.

use crate::error::FetchError;
use crate::error::SourceError;
use crate::source::Page;

/// Opaque, monotonically increasing request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Lifecycle status of a table's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// A request is in flight; previous rows are still shown.
    Loading,
    /// The latest request succeeded.
    Success,
    /// The latest request failed.
    Error,
}

/// What [`FetchState::resolve`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The result belonged to the latest request and replaced the state.
    Applied,
    /// A newer request was issued; the result was dropped.
    Stale,
}

/// Rows, total and status for one table instance.
#[derive(Debug, Clone)]
pub struct FetchState<R> {
    status: FetchStatus,
    data: Vec<R>,
    total: Option<u64>,
    error: Option<FetchError>,
    latest: RequestToken,
    /// Status and error of the last applied resolution, restored on
    /// `invalidate`.
    settled: FetchStatus,
    settled_error: Option<FetchError>,
}

impl<R> Default for FetchState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FetchState<R> {
    pub fn new() -> Self {
        Self {
            status: FetchStatus::Idle,
            data: Vec::new(),
            total: None,
            error: None,
            latest: RequestToken::default(),
            settled: FetchStatus::Idle,
            settled_error: None,
        }
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    /// Total row count, `None` until a response reports one.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// The failure of the latest request, only while `status` is `Error`.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Issues a new request token and enters `Loading`.
    ///
    /// Rows and total are kept so the table does not flash empty. The
    /// previous error is cleared.
    pub fn begin(&mut self) -> RequestToken {
        self.latest = RequestToken(self.latest.0 + 1);
        self.status = FetchStatus::Loading;
        self.error = None;
        self.latest
    }

    /// Applies the result of request `token` if it is still the latest.
    ///
    /// On failure, rows from the last success are kept.
    pub fn resolve(&mut self, token: RequestToken, result: Result<Page<R>, SourceError>) -> Resolution {
        if token != self.latest {
            return Resolution::Stale;
        }

        match result {
            Ok(page) => {
                let (rows, total) = page.into_parts();
                self.data = rows;
                self.total = total;
                self.error = None;
                self.status = FetchStatus::Success;
            }
            Err(err) => {
                self.error = Some(FetchError::from(&err));
                self.status = FetchStatus::Error;
            }
        }
        self.settled = self.status;
        self.settled_error = self.error.clone();
        Resolution::Applied
    }

    /// Voids every outstanding token; later resolutions are all stale.
    pub fn invalidate(&mut self) {
        self.latest = RequestToken(self.latest.0 + 1);
        if self.status == FetchStatus::Loading {
            self.status = self.settled;
            self.error = self.settled_error.clone();
        }
    }
}
