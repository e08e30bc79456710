//! Single-page fetches against the remote list API.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::options::{GridConfig, LogLevel};
use super::Record;
use crate::transport::{ApiRequest, RequestFormat, RequestVerb, Transport};

/// Hooks for a visual "loading" state around page fetches
pub trait LoadingIndicator: Send + Sync {
  fn show(&self, message: &str);
  fn hide(&self);
}

/// Releases the loading state when dropped, on every exit path of a fetch
struct LoadingGuard<'a> {
  indicator: Option<&'a dyn LoadingIndicator>,
}

impl<'a> LoadingGuard<'a> {
  fn acquire(indicator: Option<&'a dyn LoadingIndicator>, show: bool, index: usize) -> Self {
    if let (Some(indicator), true) = (indicator, show) {
      indicator.show(&format!("Loading page {}...", index + 1));
    }
    Self { indicator }
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    if let Some(indicator) = self.indicator {
      indicator.hide();
    }
  }
}

/// Response body of a page request: total record count plus this page's records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageData {
  #[serde(default)]
  pub count: u64,
  #[serde(default)]
  pub result: Vec<Record>,
}

/// Builds page requests from the resolved config and runs them through the transport.
pub struct DataFetcher {
  transport: Arc<dyn Transport>,
  url: String,
  verb: RequestVerb,
  format: RequestFormat,
  params: Map<String, Value>,
  use_pagination: bool,
  page_size: usize,
  loading: Option<Arc<dyn LoadingIndicator>>,
  log_level: LogLevel,
}

impl DataFetcher {
  pub fn new(config: &GridConfig) -> Self {
    Self {
      transport: Arc::clone(&config.api_caller),
      url: config.api_url.clone(),
      verb: config.api_request_verb,
      format: config.api_request_format,
      params: config.api_params.clone(),
      use_pagination: config.use_pagination,
      page_size: config.page_size,
      loading: config.loading_controls.clone(),
      log_level: config.log_level,
    }
  }

  /// Request for zero-based `index`; the API sees a 1-based `page`
  pub fn request_for(&self, index: usize) -> ApiRequest {
    let mut params = self.params.clone();
    params.insert("usePagination".to_string(), Value::Bool(self.use_pagination));
    params.insert("page".to_string(), Value::from(index + 1));
    params.insert("pageSize".to_string(), Value::from(self.page_size));

    ApiRequest {
      url: self.url.clone(),
      verb: self.verb,
      format: self.format,
      params,
    }
  }

  /// Fetch one page. Never retries; the caller decides what a failure means.
  pub async fn fetch(&self, index: usize, show_loading: bool) -> Result<PageData> {
    grid_debug!(self.log_level, page = index, "Getting data");
    let _loading = LoadingGuard::acquire(self.loading.as_deref(), show_loading, index);

    let body = self.transport.call(self.request_for(index)).await?;
    let data: PageData = serde_json::from_value(body)
      .map_err(|e| eyre!("Unexpected response for page {}: {}", index + 1, e))?;

    grid_debug!(
      self.log_level,
      page = index,
      count = data.count,
      rows = data.result.len(),
      "Data retrieved"
    );
    Ok(data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grid::options::{resolve, GridOptions};
  use crate::grid::testing::{MemoryTransport, RecordingIndicator};
  use serde_json::json;

  fn fetcher(transport: MemoryTransport, indicator: Option<Arc<RecordingIndicator>>) -> DataFetcher {
    let mut options = GridOptions {
      page_size: Some(10),
      ..Default::default()
    }
    .with_api_caller(Arc::new(transport));
    options.api_params.insert("status".to_string(), json!("open"));
    if let Some(indicator) = indicator {
      options = options.with_loading_controls(indicator);
    }
    let config = resolve("items", "http://localhost/items", options).unwrap();
    DataFetcher::new(&config)
  }

  #[test]
  fn test_request_carries_params_and_one_based_page() {
    let request = fetcher(MemoryTransport::with_records(5), None).request_for(2);
    assert_eq!(request.url, "http://localhost/items");
    assert_eq!(request.params["status"], json!("open"));
    assert_eq!(request.params["usePagination"], json!(true));
    assert_eq!(request.params["page"], json!(3));
    assert_eq!(request.params["pageSize"], json!(10));
  }

  #[tokio::test]
  async fn test_fetch_decodes_page() {
    let data = fetcher(MemoryTransport::with_records(25), None)
      .fetch(2, true)
      .await
      .unwrap();
    assert_eq!(data.count, 25);
    assert_eq!(data.result.len(), 5);
    assert_eq!(data.result[0]["id"], json!(21));
  }

  #[tokio::test]
  async fn test_loading_hidden_on_success_and_failure() {
    let indicator = Arc::new(RecordingIndicator::default());
    let transport = MemoryTransport::with_records(25);
    transport.fail_page(1);
    let fetcher = fetcher(transport, Some(Arc::clone(&indicator)));

    assert!(fetcher.fetch(0, true).await.is_ok());
    assert!(fetcher.fetch(1, true).await.is_err());
    assert_eq!(
      indicator.calls(),
      vec![
        "show:Loading page 1...",
        "hide",
        "show:Loading page 2...",
        "hide"
      ]
    );
  }

  #[tokio::test]
  async fn test_quiet_fetch_does_not_show_loading() {
    let indicator = Arc::new(RecordingIndicator::default());
    let fetcher = fetcher(
      MemoryTransport::with_records(25),
      Some(Arc::clone(&indicator)),
    );

    fetcher.fetch(0, false).await.unwrap();
    assert_eq!(indicator.calls(), vec!["hide"]);
  }

  #[tokio::test]
  async fn test_malformed_response_is_an_error() {
    let transport = MemoryTransport::with_records(5);
    transport.respond_with(json!(["not", "a", "page"]));
    assert!(fetcher(transport, None).fetch(0, true).await.is_err());
  }
}
