//! Line commands read from stdin.

use chrono::NaiveDate;
use thiserror::Error;

use remote_table::query::FilterValue;
use remote_table::registry::FilterKind;

pub const HELP: &str = "\
commands:
  page <n|next|prev>         go to a page
  size <n>                   change the page size
  sort <field>               sort by a column (asc, desc, none)
  filter <field> <value>     set a filter (dates as YYYY-MM-DD, ranges as FROM..TO)
  unfilter <field>           clear a filter
  search [text]              set the search term (empty clears it)
  reset                      clear every filter and the search term
  select <id>...             toggle rows by id
  select-all                 toggle every row of the page
  clear-selection            deselect everything
  column <field>             show or hide a column
  refresh                    reload the current page
  action <n>                 run bulk action n on the selected rows
  help                       show this help
  quit                       exit";

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("'{0}' is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    Number(u32),
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(PageTarget),
    Size(u32),
    Sort(String),
    Filter { field: String, value: String },
    Unfilter(String),
    Search(String),
    Reset,
    Select(Vec<String>),
    SelectAll,
    ClearSelection,
    Column(String),
    Refresh,
    Action(usize),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "" => return Ok(None),
            "page" | "p" => Self::Page(match required(rest, "page", "a page number")? {
                "next" | "n" => PageTarget::Next,
                "prev" | "previous" => PageTarget::Previous,
                n => PageTarget::Number(number(n)?),
            }),
            "size" => Self::Size(number(required(rest, "size", "a page size")?)?),
            "sort" => Self::Sort(required(rest, "sort", "a field")?.to_string()),
            "filter" | "f" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(field, value)| (field, value.trim()))
                    .filter(|(_, value)| !value.is_empty())
                    .ok_or(CommandError::MissingArgument {
                        command: "filter",
                        argument: "a field and a value",
                    })?;
                Self::Filter {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            "unfilter" => Self::Unfilter(required(rest, "unfilter", "a field")?.to_string()),
            "search" | "s" => Self::Search(rest.to_string()),
            "reset" => Self::Reset,
            "select" => Self::Select(
                required(rest, "select", "at least one id")?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            ),
            "select-all" => Self::SelectAll,
            "clear-selection" => Self::ClearSelection,
            "column" => Self::Column(required(rest, "column", "a field")?.to_string()),
            "refresh" | "r" => Self::Refresh,
            "action" | "a" => Self::Action(
                required(rest, "action", "an action number")?
                    .parse()
                    .map_err(|_| CommandError::InvalidNumber(rest.to_string()))?,
            ),
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

fn number(text: &str) -> Result<u32, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}

fn date(text: &str) -> Result<Option<NaiveDate>, CommandError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CommandError::InvalidDate(text.to_string()))
}

/// Turn a raw filter argument into a value for a filter of `kind`.
///
/// Date ranges are written `FROM..TO`; either side may be left empty.
pub fn filter_value(kind: Option<&FilterKind>, raw: &str) -> Result<FilterValue, CommandError> {
    match kind {
        Some(FilterKind::Date) => Ok(date(raw)?.map(FilterValue::Date).unwrap_or_default()),
        Some(FilterKind::DateRange) => {
            let (from, to) = raw.split_once("..").unwrap_or((raw, ""));
            Ok(FilterValue::range(date(from)?, date(to)?))
        }
        _ => Ok(FilterValue::text(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_paging() {
        assert_eq!(parse("page 3"), Command::Page(PageTarget::Number(3)));
        assert_eq!(parse("p next"), Command::Page(PageTarget::Next));
        assert_eq!(parse("page prev"), Command::Page(PageTarget::Previous));
        assert_eq!(parse("size 25"), Command::Size(25));
        assert_eq!(
            Command::parse("page trois"),
            Err(CommandError::InvalidNumber("trois".into()))
        );
    }

    #[test]
    fn test_parse_filter_keeps_spaces_in_value() {
        assert_eq!(
            parse("filter service  Ressources humaines "),
            Command::Filter {
                field: "service".into(),
                value: "Ressources humaines".into(),
            }
        );
        assert_eq!(
            Command::parse("filter status"),
            Err(CommandError::MissingArgument {
                command: "filter",
                argument: "a field and a value",
            })
        );
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(parse("search jean pierre"), Command::Search("jean pierre".into()));
        assert_eq!(parse("search"), Command::Search(String::new()));
    }

    #[test]
    fn test_parse_selection_and_actions() {
        assert_eq!(parse("select 3 7"), Command::Select(vec!["3".into(), "7".into()]));
        assert_eq!(parse("select-all"), Command::SelectAll);
        assert_eq!(parse("action 1"), Command::Action(1));
        assert_eq!(parse("  q "), Command::Quit);
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(Command::parse("frobnicate"), Err(CommandError::Unknown("frobnicate".into())));
    }

    #[test]
    fn test_filter_values() {
        assert_eq!(
            filter_value(Some(&FilterKind::Text), "validee"),
            Ok(FilterValue::text("validee"))
        );
        assert_eq!(
            filter_value(Some(&FilterKind::Date), "2024-03-01"),
            Ok(FilterValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(
            filter_value(Some(&FilterKind::DateRange), "2024-01-01.."),
            Ok(FilterValue::range(NaiveDate::from_ymd_opt(2024, 1, 1), None))
        );
        assert_eq!(
            filter_value(Some(&FilterKind::Date), "01/03/2024"),
            Err(CommandError::InvalidDate("01/03/2024".into()))
        );
    }
}
