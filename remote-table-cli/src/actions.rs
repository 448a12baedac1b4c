//! Bulk actions and option loaders backed by the table's REST endpoint.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use remote_table::TableController;
use remote_table::TableRow;
use remote_table::error::SourceError;
use remote_table::registry::BulkAction;
use remote_table::registry::SelectOption;
use remote_table::source::JsonRecord;
use remote_table::source::parse_error_body;

/// Shared HTTP settings for requests outside the list fetch.
#[derive(Clone)]
pub struct Backend {
    client: Client,
    endpoint: Url,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
}

impl Backend {
    pub fn new(
        endpoint: &str,
        bearer_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SourceError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SourceError::InvalidUrl(format!("{endpoint}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            bearer_token,
            timeout,
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// `<endpoint>/<id>`, with the id as one escaped path segment.
    fn item_url(&self, id: &str) -> Result<Url, SourceError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// `DELETE <endpoint>/<id>`.
    pub async fn delete(&self, id: &str) -> Result<(), SourceError> {
        let url = self.item_url(id)?;
        log::debug!("DELETE {}", url);
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }

    /// `GET <url>` returning `[{"label": .., "value": ..}]`.
    pub async fn options(&self, url: &str) -> Result<Vec<SelectOption>, SourceError> {
        let url = self
            .endpoint
            .join(url)
            .map_err(|e| SourceError::InvalidUrl(format!("{url}: {e}")))?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &body));
        }
        let values: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse_with_body(e.to_string(), body.clone()))?;
        Ok(values
            .into_iter()
            .filter_map(|value| {
                let value_of = |key: &str| match value.get(key)? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
                let raw = value_of("value")?;
                let label = value_of("label").unwrap_or_else(|| raw.clone());
                Some(SelectOption::new(label, raw))
            })
            .collect())
    }
}

/// Prints the identifiers of the selected rows.
pub fn print_ids() -> BulkAction<JsonRecord> {
    BulkAction::new("Print ids", |rows: Vec<JsonRecord>, _table| async move {
        let ids: Vec<String> = rows.iter().map(|row| row.key().to_string()).collect();
        println!("selected: {}", ids.join(", "));
    })
}

/// Deletes the selected rows one by one, then clears the selection and
/// refreshes the table.
pub fn delete(backend: Backend) -> BulkAction<JsonRecord> {
    BulkAction::new(
        "Delete",
        move |rows: Vec<JsonRecord>, table: TableController<JsonRecord>| {
            let backend = backend.clone();
            async move {
                let mut deleted = 0;
                for row in &rows {
                    let id = row.key().to_string();
                    match backend.delete(&id).await {
                        Ok(()) => deleted += 1,
                        Err(err) => {
                            log::warn!("Deleting {} failed: {}", id, err);
                            eprintln!("delete {id}: {err}");
                        }
                    }
                }
                log::info!("Deleted {} of {} rows", deleted, rows.len());
                table.clear_selection();
                table.refresh();
            }
        },
    )
    .icon("x")
}
