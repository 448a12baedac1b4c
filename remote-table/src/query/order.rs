//! Sort direction for column ordering.

use std::fmt;

/// Sort direction for a column.
///
/// Repeated sort requests on the same column cycle `Asc → Desc → None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
    /// No ordering requested.
    #[default]
    None,
}

impl SortDirection {
    /// The next direction in the sort cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::None,
            Self::None => Self::Asc,
        }
    }

    /// Query parameter value, `None` when unsorted.
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Self::Asc => Some("asc"),
            Self::Desc => Some("desc"),
            Self::None => None,
        }
    }

    /// Header indicator for this direction.
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
            Self::None => "",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param().unwrap_or("none"))
    }
}
