//! Tests for the REST data source against a local HTTP server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::NaiveDate;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpListener;

use remote_table::TableRow;
use remote_table::error::SourceError;
use remote_table::query::FilterValue;
use remote_table::query::Pagination;
use remote_table::query::QueryState;
use remote_table::source::DataSource;
use remote_table::source::HttpDataSource;

/// What the server saw for one request.
#[derive(Debug, Clone)]
struct Seen {
    path_and_query: String,
    authorization: Option<String>,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Canned {
    fn ok(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn status(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

struct TestServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl TestServer {
    /// Serve `canned` for every request.
    async fn start(canned: Canned) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let log = Arc::clone(&log);
                let canned = canned.clone();
                let service = service_fn(move |req: Request<Incoming>| {
                    let canned = canned.clone();
                    log.lock().unwrap().push(Seen {
                        path_and_query: req
                            .uri()
                            .path_and_query()
                            .map(|pq| pq.to_string())
                            .unwrap_or_default(),
                        authorization: req
                            .headers()
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                    });
                    async move {
                        let mut response = Response::builder()
                            .status(canned.status)
                            .header("Content-Type", "application/json");
                        for (name, value) in &canned.headers {
                            response = response.header(*name, value.as_str());
                        }
                        Ok::<_, Infallible>(
                            response.body(Full::new(Bytes::from(canned.body))).unwrap(),
                        )
                    }
                });
                tokio::spawn(async move {
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, seen }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("no request")
    }
}

fn first_page() -> QueryState {
    QueryState::new(10)
}

// =============================================================================
// Envelopes
// =============================================================================

#[tokio::test]
async fn test_data_envelope_with_total() {
    let server = TestServer::start(Canned::ok(
        r#"{"data": [{"id": 1, "lastName": "Dupont"}, {"id": 2, "lastName": "Martin"}], "total": 42}"#,
    ))
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let page = source.fetch(&first_page().to_request()).await.unwrap();
    assert_eq!(page.total(), Some(42));
    assert_eq!(page.rows().len(), 2);
    assert_eq!(page.rows()[1].key().to_string(), "2");
    assert_eq!(page.rows()[0].get_str("lastName"), Some("Dupont"));
}

#[tokio::test]
async fn test_items_envelope_with_meta_total() {
    let server = TestServer::start(Canned::ok(
        r#"{"items": [{"matricule": "E-001"}], "meta": {"total": 7}}"#,
    ))
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees"))
        .id_field("matricule")
        .build()
        .unwrap();

    let page = source.fetch(&first_page().to_request()).await.unwrap();
    assert_eq!(page.total(), Some(7));
    assert_eq!(page.rows()[0].key().to_string(), "E-001");
}

#[tokio::test]
async fn test_bare_array_uses_total_header() {
    let server = TestServer::start(
        Canned::ok(r#"[{"id": "a"}, {"id": "b"}]"#).header("X-Total-Count", "25"),
    )
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let page = source.fetch(&first_page().to_request()).await.unwrap();
    assert_eq!(page.total(), Some(25));
    assert_eq!(page.rows().len(), 2);
}

#[tokio::test]
async fn test_bare_array_without_total() {
    let server = TestServer::start(Canned::ok(r#"[{"id": 1}]"#)).await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let page = source.fetch(&first_page().to_request()).await.unwrap();
    assert_eq!(page.total(), None);
}

#[tokio::test]
async fn test_typed_rows() {
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Employee {
        id: u32,
        last_name: String,
    }

    impl TableRow for Employee {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn value(&self, field: &str) -> serde_json::Value {
            match field {
                "lastName" => self.last_name.clone().into(),
                _ => serde_json::Value::Null,
            }
        }
    }

    let server = TestServer::start(Canned::ok(
        r#"{"results": [{"id": 3, "lastName": "Bernard"}], "count": 1}"#,
    ))
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees"))
        .build_typed::<Employee>()
        .unwrap();

    let page = source.fetch(&first_page().to_request()).await.unwrap();
    assert_eq!(page.rows()[0].key(), 3);
    assert_eq!(page.rows()[0].last_name, "Bernard");
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = TestServer::start(Canned::ok("<html>maintenance</html>")).await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let err = source.fetch(&first_page().to_request()).await.unwrap_err();
    match err {
        SourceError::Parse { body, .. } => {
            assert_eq!(body.as_deref(), Some("<html>maintenance</html>"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

// =============================================================================
// Request parameters
// =============================================================================

#[tokio::test]
async fn test_query_parameters() {
    let server = TestServer::start(Canned::ok(r#"{"data": [], "total": 0}"#)).await;
    let source = HttpDataSource::builder(server.url("/api/employees"))
        .bearer_token("jeton")
        .build()
        .unwrap();

    let mut query = QueryState::new(25);
    query.set_sort("hireDate");
    query.set_sort("hireDate");
    query.set_filter("status", "validee");
    query.set_filter(
        "hireDate",
        FilterValue::range(NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 6, 30)),
    );
    query.set_search("jean");
    query.set_page(2);
    source.fetch(&query.to_request()).await.unwrap();

    let seen = server.last();
    assert_eq!(
        seen.path_and_query,
        "/api/employees?page=2&pageSize=25&sortBy=hireDate&sortDir=desc\
         &hireDateFrom=2024-01-01&hireDateTo=2024-06-30&status=validee&search=jean"
    );
    assert_eq!(seen.authorization.as_deref(), Some("Bearer jeton"));
}

#[tokio::test]
async fn test_offset_limit_parameters() {
    let server = TestServer::start(Canned::ok("[]")).await;
    let source = HttpDataSource::builder(server.url("/api/employees"))
        .pagination(Pagination::OffsetLimit)
        .build()
        .unwrap();

    let mut query = QueryState::new(10);
    query.set_page(3);
    source.fetch(&query.to_request()).await.unwrap();

    assert_eq!(server.last().path_and_query, "/api/employees?offset=20&limit=10");
    assert_eq!(server.last().authorization, None);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_error_message_and_code() {
    let server = TestServer::start(Canned::status(
        422,
        r#"{"message": "La date de fin précède la date de début", "code": "INVALID_RANGE"}"#,
    ))
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let err = source.fetch(&first_page().to_request()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(422));
    assert_eq!(err.error_code(), Some("INVALID_RANGE"));
    assert!(err.to_string().contains("La date de fin précède la date de début"));
}

#[tokio::test]
async fn test_nested_error_object() {
    let server = TestServer::start(Canned::status(
        403,
        r#"{"error": {"code": "FORBIDDEN", "message": "Accès refusé"}}"#,
    ))
    .await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let err = source.fetch(&first_page().to_request()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.error_code(), Some("FORBIDDEN"));
}

#[tokio::test]
async fn test_error_without_body() {
    let server = TestServer::start(Canned::status(500, "")).await;
    let source = HttpDataSource::builder(server.url("/api/employees")).build().unwrap();

    let err = source.fetch(&first_page().to_request()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(
        remote_table::error::FetchError::from(&err).message,
        "Request failed with status 500"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpDataSource::builder(format!("http://{addr}/api/employees"))
        .build()
        .unwrap();
    let err = source.fetch(&first_page().to_request()).await.unwrap_err();
    assert!(err.is_transport());
}
