//! In-memory transport, loading indicator and renderer for engine tests.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};

use super::cache::Page;
use super::column::Column;
use super::fetcher::LoadingIndicator;
use super::options::{GridConfig, InsertAt};
use super::render::{PaginationControls, Renderer};
use super::Record;
use crate::transport::{ApiRequest, Transport};

/// Record `id` as served by [`MemoryTransport`]
pub fn record(id: u64) -> Record {
  json!({
    "id": id,
    "name": format!("Item {}", id),
    "ownerId": id % 3,
    "status": "open",
  })
  .as_object()
  .cloned()
  .unwrap_or_default()
}

#[derive(Default)]
struct Served {
  records: Vec<Record>,
  failing: HashSet<usize>,
  canned: Option<Value>,
  requests: Vec<Map<String, Value>>,
}

/// Serves pages of a fixed dataset, paging by the request's `page` and `pageSize`
#[derive(Default)]
pub struct MemoryTransport {
  served: Mutex<Served>,
}

impl MemoryTransport {
  pub fn with_records(count: u64) -> Self {
    let served = Served {
      records: (1..=count).map(record).collect(),
      ..Default::default()
    };
    Self {
      served: Mutex::new(served),
    }
  }

  /// Make requests for zero-based page `index` fail
  pub fn fail_page(&self, index: usize) {
    self.served.lock().unwrap().failing.insert(index);
  }

  /// Answer every request with `body` instead of a page
  pub fn respond_with(&self, body: Value) {
    self.served.lock().unwrap().canned = Some(body);
  }

  pub fn set_field(&self, id: u64, field: &str, value: Value) {
    let mut served = self.served.lock().unwrap();
    if let Some(r) = served.records.iter_mut().find(|r| r["id"] == json!(id)) {
      r.insert(field.to_string(), value);
    }
  }

  /// Zero-based page indices requested so far, in order
  pub fn requested(&self) -> Vec<usize> {
    self
      .served
      .lock()
      .unwrap()
      .requests
      .iter()
      .filter_map(|p| p["page"].as_u64())
      .map(|page| page as usize - 1)
      .collect()
  }

  pub fn last_request(&self) -> Option<Map<String, Value>> {
    self.served.lock().unwrap().requests.last().cloned()
  }

  fn answer(&self, request: ApiRequest) -> Result<Value> {
    let mut served = self.served.lock().unwrap();
    let page = request.params["page"].as_u64().unwrap_or(1) as usize;
    let page_size = request.params["pageSize"].as_u64().unwrap_or(10) as usize;
    served.requests.push(request.params);

    if let Some(body) = &served.canned {
      return Ok(body.clone());
    }
    if served.failing.contains(&(page - 1)) {
      return Err(eyre!("page {} unavailable", page));
    }

    let result: Vec<Record> = served
      .records
      .iter()
      .skip((page - 1) * page_size)
      .take(page_size)
      .cloned()
      .collect();
    Ok(json!({ "count": served.records.len(), "result": result }))
  }
}

impl Transport for MemoryTransport {
  fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<Value>> {
    let answer = self.answer(request);
    Box::pin(async move { answer })
  }
}

#[derive(Default)]
pub struct RecordingIndicator {
  calls: Mutex<Vec<String>>,
}

impl RecordingIndicator {
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }
}

impl LoadingIndicator for RecordingIndicator {
  fn show(&self, message: &str) {
    self.calls.lock().unwrap().push(format!("show:{}", message));
  }

  fn hide(&self) {
    self.calls.lock().unwrap().push("hide".to_string());
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
  Grid(Vec<String>),
  Page { index: usize, ids: Vec<u64> },
  Insert { id: u64, at: InsertAt, styles: String },
  Replace { id: u64 },
  Remove { id: u64 },
  Pagination(PaginationControls),
}

fn id_of(value: &Value) -> u64 {
  value.as_u64().unwrap_or_default()
}

/// Renderer that writes down every call it receives
#[derive(Default)]
pub struct RecordingRenderer {
  log: Arc<Mutex<Vec<RenderCall>>>,
}

impl RecordingRenderer {
  pub fn log(&self) -> Arc<Mutex<Vec<RenderCall>>> {
    Arc::clone(&self.log)
  }

  pub fn calls(&self) -> Vec<RenderCall> {
    self.log.lock().unwrap().clone()
  }

  fn push(&self, call: RenderCall) {
    self.log.lock().unwrap().push(call);
  }
}

impl Renderer for RecordingRenderer {
  fn render_grid(&mut self, columns: &[Column], _config: &GridConfig) {
    self.push(RenderCall::Grid(
      columns.iter().map(|c| c.key.clone()).collect(),
    ));
  }

  fn render_page(&mut self, page: &Page) {
    self.push(RenderCall::Page {
      index: page.index,
      ids: page.data.result.iter().map(|r| id_of(&r["id"])).collect(),
    });
  }

  fn insert_row(&mut self, record: &Record, at: InsertAt, styles: &str) {
    self.push(RenderCall::Insert {
      id: id_of(&record["id"]),
      at,
      styles: styles.to_string(),
    });
  }

  fn replace_row(&mut self, key: &Value, _record: &Record, _styles: &str) {
    self.push(RenderCall::Replace { id: id_of(key) });
  }

  fn remove_row(&mut self, key: &Value) {
    self.push(RenderCall::Remove { id: id_of(key) });
  }

  fn render_pagination(&mut self, controls: &PaginationControls) {
    self.push(RenderCall::Pagination(*controls));
  }
}

/// Collects formatted `tracing` output from a thread-scoped DEBUG subscriber
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
  /// Capture everything up to DEBUG until the guard is dropped
  pub fn install(&self) -> tracing::subscriber::DefaultGuard {
    let writer = self.clone();
    let subscriber = tracing_subscriber::fmt()
      .with_max_level(tracing::Level::DEBUG)
      .with_ansi(false)
      .with_writer(move || writer.clone())
      .finish();
    tracing::subscriber::set_default(subscriber)
  }

  pub fn lines(&self) -> Vec<String> {
    let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes)
      .lines()
      .map(str::to_string)
      .collect()
  }
}

impl io::Write for LogCapture {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    if let Ok(mut bytes) = self.0.lock() {
      bytes.extend_from_slice(buf);
    }
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
