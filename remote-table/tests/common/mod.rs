//! Shared fixtures: an in-memory employee backend with scripted latency
//! and failures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use tokio::sync::Notify;
use tokio::sync::oneshot;

use remote_table::TableController;
use remote_table::error::SourceError;
use remote_table::query::FilterValue;
use remote_table::query::PageRequest;
use remote_table::query::SortDirection;
use remote_table::source::DataSource;
use remote_table::source::JsonRecord;
use remote_table::source::Page;
use remote_table::source::RecordKey;

const LAST_NAMES: [&str; 25] = [
    "Dupont", "Martin", "Bernard", "Thomas", "Petit", "Robert", "Richard", "Durand", "Dubois",
    "Moreau", "Laurent", "Simon", "Michel", "Lefebvre", "Leroy", "Roux", "David", "Bertrand",
    "Morel", "Fournier", "Girard", "Bonnet", "Dupuis", "Lambert", "Fontaine",
];

const FIRST_NAMES: [&str; 5] = ["Jean", "Marie", "Pierre", "Sophie", "Luc"];

/// 25 employees; every third one is a draft (`brouillon`), the rest are
/// validated (`validee`).
pub fn employees() -> Vec<Value> {
    LAST_NAMES
        .iter()
        .enumerate()
        .map(|(i, last_name)| {
            let id = i + 1;
            json!({
                "id": id,
                "firstName": FIRST_NAMES[i % FIRST_NAMES.len()],
                "lastName": last_name,
                "status": if id % 3 == 0 { "brouillon" } else { "validee" },
            })
        })
        .collect()
}

pub fn key(id: u64) -> RecordKey {
    RecordKey::new(id.to_string())
}

pub fn ids(rows: &[JsonRecord]) -> Vec<String> {
    use remote_table::TableRow;
    rows.iter().map(|row| row.key().to_string()).collect()
}

/// Releases one held request.
pub struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

#[derive(Default)]
struct Script {
    gates: VecDeque<oneshot::Receiver<()>>,
    failures: VecDeque<SourceError>,
}

struct Inner {
    rows: Mutex<Vec<Value>>,
    requests: Mutex<Vec<PageRequest>>,
    script: Mutex<Script>,
    responses: Mutex<usize>,
    responded: Notify,
}

/// In-memory backend that filters, sorts and pages like a real one.
#[derive(Clone)]
pub struct EmployeeSource {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EmployeeSource {
    pub fn new() -> Self {
        Self::with_rows(employees())
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: Mutex::new(rows),
                requests: Mutex::new(Vec::new()),
                script: Mutex::new(Script::default()),
                responses: Mutex::new(0),
                responded: Notify::new(),
            }),
        }
    }

    /// Hold the next request until the returned gate is released.
    pub fn hold_next(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        lock(&self.inner.script).gates.push_back(rx);
        Gate { tx }
    }

    /// Fail the next request with `error`.
    pub fn fail_next(&self, error: SourceError) {
        lock(&self.inner.script).failures.push_back(error);
    }

    pub fn delete(&self, id: u64) {
        lock(&self.inner.rows).retain(|row| row["id"] != json!(id));
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        lock(&self.inner.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.inner.requests).len()
    }

    pub fn last_request(&self) -> PageRequest {
        lock(&self.inner.requests)
            .last()
            .cloned()
            .expect("no request issued")
    }

    pub fn responses(&self) -> usize {
        *lock(&self.inner.responses)
    }

    /// Wait until the backend has answered `count` requests in total.
    pub async fn wait_responses(&self, count: usize) {
        loop {
            let notified = self.inner.responded.notified();
            if self.responses() >= count {
                break;
            }
            notified.await;
        }
        // Let the controller task apply the response.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn query(&self, request: &PageRequest) -> Page<JsonRecord> {
        let mut rows: Vec<Value> = lock(&self.inner.rows)
            .iter()
            .filter(|row| matches_filters(row, request))
            .filter(|row| matches_search(row, request.search.as_deref()))
            .cloned()
            .collect();

        if let Some((field, direction)) = &request.sort {
            rows.sort_by(|a, b| {
                let ordering = a[field].to_string().cmp(&b[field].to_string());
                match direction {
                    SortDirection::Desc => ordering.reverse(),
                    _ => ordering,
                }
            });
        }

        let total = rows.len() as u64;
        let page = rows
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size as usize)
            .map(|row| JsonRecord::from_value(row, "id").expect("fixture row"))
            .collect();
        Page::new(page).with_total(total)
    }
}

fn matches_filters(row: &Value, request: &PageRequest) -> bool {
    request.filters.iter().all(|(field, value)| match value {
        FilterValue::Text(text) => row[field].as_str() == Some(text.as_str()),
        _ => true,
    })
}

fn matches_search(row: &Value, search: Option<&str>) -> bool {
    let Some(search) = search else {
        return true;
    };
    let needle = search.to_lowercase();
    ["firstName", "lastName"].iter().any(|field| {
        row[field]
            .as_str()
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    })
}

#[async_trait]
impl DataSource<JsonRecord> for EmployeeSource {
    async fn fetch(&self, request: &PageRequest) -> Result<Page<JsonRecord>, SourceError> {
        let gate = {
            lock(&self.inner.requests).push(request.clone());
            lock(&self.inner.script).gates.pop_front()
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let failure = lock(&self.inner.script).failures.pop_front();
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.query(request)),
        };

        *lock(&self.inner.responses) += 1;
        self.inner.responded.notify_waiters();
        result
    }
}

/// Mount a table over `source` and wait for the first page.
pub async fn mount_settled(source: &EmployeeSource) -> TableController<JsonRecord> {
    let table = TableController::builder(source.clone())
        .config(remote_table::TableConfig::default())
        .mount();
    table.settled().await;
    table
}
