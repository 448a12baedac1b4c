//! Table definition loaded from a JSON file.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use remote_table::TableConfig;
use remote_table::query::Pagination;
use remote_table::registry::SelectOption;

/// Config loading error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config path given and no platform config directory")]
    NoConfigDir,
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationStyle {
    #[default]
    Page,
    Offset,
}

impl From<PaginationStyle> for Pagination {
    fn from(style: PaginationStyle) -> Self {
        match style {
            PaginationStyle::Page => Pagination::PageAndSize,
            PaginationStyle::Offset => Pagination::OffsetLimit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSettings {
    pub field: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub hideable: bool,
}

impl ColumnSettings {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKindSettings {
    Text,
    Select,
    Date,
    DateRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionSettings {
    pub label: String,
    pub value: String,
}

impl From<OptionSettings> for SelectOption {
    fn from(option: OptionSettings) -> Self {
        SelectOption::new(option.label, option.value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    pub field: String,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: FilterKindSettings,
    /// Fixed options of a select filter.
    #[serde(default)]
    pub options: Vec<OptionSettings>,
    /// URL returning `[{"label": .., "value": ..}]` for a select filter.
    #[serde(default)]
    pub options_url: Option<String>,
}

impl FilterSettings {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

/// Everything needed to mount one table.
///
/// ```json
/// {
///   "endpoint": "https://rh.example.org/api/employees",
///   "id_field": "id",
///   "page_size": 25,
///   "columns": [{ "field": "lastName", "label": "Nom", "sortable": true }],
///   "filters": [{ "field": "status", "kind": "select",
///                 "options": [{ "label": "Validée", "value": "validee" }] }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub endpoint: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub pagination: PaginationStyle,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub page_size_options: Option<Vec<u32>>,
    #[serde(default)]
    pub search_debounce_ms: Option<u64>,
    #[serde(default)]
    pub empty_message: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSettings>,
    #[serde(default)]
    pub filters: Vec<FilterSettings>,
}

fn default_true() -> bool {
    true
}

fn default_id_field() -> String {
    "id".to_string()
}

impl TableSettings {
    /// Load from `path`, or from the platform config dir when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => crate::paths::default_config().ok_or(ConfigError::NoConfigDir)?,
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let settings = Self::parse(&text).map_err(|err| match err {
            ParseFailure::Json(source) => ConfigError::Parse { path, source },
            ParseFailure::Invalid(err) => err,
        })?;
        log::info!("Loaded table config for {}", settings.endpoint);
        Ok(settings)
    }

    fn parse(text: &str) -> Result<Self, ParseFailure> {
        let settings: Self = serde_json::from_str(text).map_err(ParseFailure::Json)?;
        settings.validate().map_err(ParseFailure::Invalid)?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::Invalid("at least one column is required".into()));
        }
        if self.page_size == Some(0) {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        for filter in &self.filters {
            let has_options = !filter.options.is_empty() || filter.options_url.is_some();
            match filter.kind {
                FilterKindSettings::Select if !has_options => {
                    return Err(ConfigError::Invalid(format!(
                        "select filter '{}' needs options or options_url",
                        filter.field
                    )));
                }
                FilterKindSettings::Text | FilterKindSettings::Date | FilterKindSettings::DateRange
                    if has_options =>
                {
                    return Err(ConfigError::Invalid(format!(
                        "filter '{}' takes no options",
                        filter.field
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Controller tuning derived from these settings.
    pub fn table_config(&self) -> TableConfig {
        let mut config = TableConfig::default();
        if let Some(size) = self.page_size {
            config = config.with_page_size(size);
        }
        if let Some(options) = &self.page_size_options {
            config = config.with_page_size_options(options.iter().copied());
        }
        if let Some(ms) = self.search_debounce_ms {
            config = config.with_search_debounce(Duration::from_millis(ms));
        }
        if let Some(message) = &self.empty_message {
            config = config.with_empty_message(message.clone());
        }
        config
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

enum ParseFailure {
    Json(serde_json::Error),
    Invalid(ConfigError),
}
