//! Filter values held in query state.

use chrono::NaiveDate;

/// Date format used for date filters on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The value of a single filter field.
///
/// `Empty` means "unset"; setting a filter to an empty value removes it from
/// the query. Blank text counts as empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterValue {
    /// Filter is unset.
    #[default]
    Empty,
    /// Free text or a select option value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// A single day.
    Date(NaiveDate),
    /// An inclusive day range; either bound may be open.
    DateRange {
        /// First day, inclusive.
        from: Option<NaiveDate>,
        /// Last day, inclusive.
        to: Option<NaiveDate>,
    },
}

impl FilterValue {
    /// Creates a text filter value.
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    /// Creates a date-range filter value.
    pub fn range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        FilterValue::DateRange { from, to }
    }

    /// Returns `true` if this value means "unset".
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Empty => true,
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::Number(n) => n.is_nan(),
            FilterValue::Date(_) => false,
            FilterValue::DateRange { from, to } => from.is_none() && to.is_none(),
        }
    }

    /// Renders this value as query parameters for `field`.
    ///
    /// Date ranges produce `<field>From` / `<field>To`, every other value a
    /// single `<field>` parameter.
    pub fn to_params(&self, field: &str) -> Vec<(String, String)> {
        match self {
            FilterValue::Empty => Vec::new(),
            FilterValue::Text(s) => vec![(field.to_string(), s.trim().to_string())],
            FilterValue::Number(n) => vec![(field.to_string(), format_number(*n))],
            FilterValue::Date(d) => vec![(field.to_string(), d.format(DATE_FORMAT).to_string())],
            FilterValue::DateRange { from, to } => {
                let mut params = Vec::new();
                if let Some(from) = from {
                    params.push((format!("{}From", field), from.format(DATE_FORMAT).to_string()));
                }
                if let Some(to) = to {
                    params.push((format!("{}To", field), to.format(DATE_FORMAT).to_string()));
                }
                params
            }
        }
    }

    /// Returns the value used to match select options, if this is a scalar.
    pub fn as_option_value(&self) -> Option<String> {
        match self {
            FilterValue::Text(s) => Some(s.trim().to_string()),
            FilterValue::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Display text for toolbar controls.
    pub fn display(&self) -> String {
        match self {
            FilterValue::Empty => String::new(),
            FilterValue::DateRange { from, to } => {
                let fmt = |d: &Option<NaiveDate>| {
                    d.map(|d| d.format(DATE_FORMAT).to_string())
                        .unwrap_or_default()
                };
                format!("{} .. {}", fmt(from), fmt(to))
            }
            FilterValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            other => other.as_option_value().unwrap_or_default(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FilterValue::Empty)
    }
}

/// Integers are written without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_values() {
        assert!(FilterValue::Empty.is_empty());
        assert!(FilterValue::text("   ").is_empty());
        assert!(FilterValue::range(None, None).is_empty());
        assert!(!FilterValue::text("validee").is_empty());
        assert!(!FilterValue::range(Some(day(2024, 1, 1)), None).is_empty());
    }

    #[test]
    fn test_params() {
        assert_eq!(
            FilterValue::text(" validee ").to_params("status"),
            vec![("status".to_string(), "validee".to_string())]
        );
        assert_eq!(
            FilterValue::from(3i64).to_params("year"),
            vec![("year".to_string(), "3".to_string())]
        );
        assert_eq!(
            FilterValue::from(2.5).to_params("rate"),
            vec![("rate".to_string(), "2.5".to_string())]
        );
        assert_eq!(
            FilterValue::Date(day(2024, 3, 9)).to_params("hiredAt"),
            vec![("hiredAt".to_string(), "2024-03-09".to_string())]
        );
    }

    #[test]
    fn test_open_range_params() {
        let value = FilterValue::range(Some(day(2024, 1, 1)), None);
        assert_eq!(
            value.to_params("startDate"),
            vec![("startDateFrom".to_string(), "2024-01-01".to_string())]
        );

        let value = FilterValue::range(Some(day(2024, 1, 1)), Some(day(2024, 1, 31)));
        assert_eq!(value.to_params("startDate").len(), 2);
        assert_eq!(value.display(), "2024-01-01 .. 2024-01-31");
    }

    #[test]
    fn test_option_from() {
        assert_eq!(FilterValue::from(None::<&str>), FilterValue::Empty);
        assert_eq!(FilterValue::from(Some("cdi")), FilterValue::text("cdi"));
    }
}
