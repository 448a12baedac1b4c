//! REST data source over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::DataSource;
use super::JsonRecord;
use super::Page;
use super::envelope::normalize_envelope;
use super::envelope::parse_error_body;
use crate::error::SourceError;
use crate::query::PageRequest;
use crate::query::Pagination;

type Decoder<R> = Box<dyn Fn(Value) -> Result<R, SourceError> + Send + Sync>;

/// A [`DataSource`] that issues `GET <endpoint>?page=..&pageSize=..` requests.
///
/// This source is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use remote_table::source::HttpDataSource;
///
/// let source = HttpDataSource::builder("https://rh.example.org/api/employees")
///     .id_field("matricule")
///     .bearer_token(token)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct HttpDataSource<R = JsonRecord> {
    inner: Arc<HttpDataSourceInner<R>>,
}

struct HttpDataSourceInner<R> {
    endpoint: Url,
    http_client: Client,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    pagination: Pagination,
    decode: Decoder<R>,
}

impl<R> Clone for HttpDataSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl HttpDataSource<JsonRecord> {
    /// Creates a new builder for the given list endpoint.
    pub fn builder(endpoint: impl Into<String>) -> HttpDataSourceBuilder {
        HttpDataSourceBuilder::new(endpoint)
    }
}

impl<R> HttpDataSource<R> {
    /// Returns the list endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Returns the pagination parameter style.
    pub fn pagination(&self) -> Pagination {
        self.inner.pagination
    }

    fn map_transport(&self, err: reqwest::Error) -> SourceError {
        match self.inner.timeout {
            Some(timeout) if err.is_timeout() => SourceError::Timeout(timeout),
            _ => SourceError::Network(err),
        }
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> DataSource<R> for HttpDataSource<R> {
    async fn fetch(&self, request: &PageRequest) -> Result<Page<R>, SourceError> {
        let inner = &self.inner;
        let params = request.to_params(inner.pagination);
        log::debug!(
            "GET {}?{}",
            inner.endpoint,
            request.query_string(inner.pagination)
        );

        let mut builder = inner.http_client.get(inner.endpoint.clone()).query(&params);
        if let Some(token) = &inner.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = inner.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_body(status.as_u16(), &body));
        }

        let header_total = response
            .headers()
            .get("x-total-count")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse_with_body(e.to_string(), body.clone()))?;

        let (rows, total) = normalize_envelope(json, header_total)?;
        let rows = rows
            .into_iter()
            .map(|row| (inner.decode)(row))
            .collect::<Result<Vec<_>, _>>()?;

        let page = Page::new(rows);
        Ok(match total {
            Some(total) => page.with_total(total),
            None => page,
        })
    }
}

/// Builder for constructing an [`HttpDataSource`].
///
/// # Defaults
///
/// - identifier field: `id`
/// - pagination: `page` / `pageSize`
/// - no bearer token, no timeout
pub struct HttpDataSourceBuilder {
    endpoint: String,
    id_field: String,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    pagination: Pagination,
    http_client: Option<Client>,
}

impl HttpDataSourceBuilder {
    /// Creates a new builder for the given list endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            id_field: "id".to_string(),
            bearer_token: None,
            timeout: None,
            pagination: Pagination::default(),
            http_client: None,
        }
    }

    /// Sets the field holding each row's primary key.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets a transport timeout for each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how the page position is sent.
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Uses a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds a source producing [`JsonRecord`] rows.
    pub fn build(self) -> Result<HttpDataSource<JsonRecord>, SourceError> {
        let id_field = self.id_field.clone();
        self.finish(Box::new(move |value| JsonRecord::from_value(value, &id_field)))
    }

    /// Builds a source deserializing rows into `R`.
    pub fn build_typed<R>(self) -> Result<HttpDataSource<R>, SourceError>
    where
        R: DeserializeOwned + Send + Sync + 'static,
    {
        self.finish(Box::new(|value| {
            serde_json::from_value(value).map_err(|e| SourceError::parse(e.to_string()))
        }))
    }

    fn finish<R>(self, decode: Decoder<R>) -> Result<HttpDataSource<R>, SourceError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                self.endpoint,
                endpoint.scheme()
            )));
        }

        Ok(HttpDataSource {
            inner: Arc::new(HttpDataSourceInner {
                endpoint,
                http_client: self.http_client.unwrap_or_default(),
                bearer_token: self.bearer_token,
                timeout: self.timeout,
                pagination: self.pagination,
                decode,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoints() {
        assert!(matches!(
            HttpDataSource::builder("not a url").build(),
            Err(SourceError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpDataSource::builder("ftp://rh.example.org/employees").build(),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let source = HttpDataSource::builder("https://rh.example.org/api/employees")
            .build()
            .unwrap();
        assert_eq!(source.endpoint().path(), "/api/employees");
        assert_eq!(source.pagination(), Pagination::PageAndSize);
    }
}
