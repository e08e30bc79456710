//! The grid engine: config resolution, page fetching, the page cache and the
//! paginator that drives them.
//!
//! A [`Grid`] owns its cache and renderer and is driven through `&mut self`, so
//! one owner always sees operations one at a time. To drive a grid from several
//! places, spawn it behind a [`GridHandle`], which queues every operation onto a
//! single worker task.

/// `tracing` events that also respect the grid's own `log_level`, on top of
/// whatever the installed subscriber filters. Errors are never gated.
macro_rules! grid_debug {
  ($level:expr, $($arg:tt)+) => {
    if $level.enables($crate::grid::LogLevel::Debug) {
      ::tracing::debug!($($arg)+);
    }
  };
}

macro_rules! grid_info {
  ($level:expr, $($arg:tt)+) => {
    if $level.enables($crate::grid::LogLevel::Info) {
      ::tracing::info!($($arg)+);
    }
  };
}

macro_rules! grid_warn {
  ($level:expr, $($arg:tt)+) => {
    if $level.enables($crate::grid::LogLevel::Warning) {
      ::tracing::warn!($($arg)+);
    }
  };
}

mod cache;
mod column;
mod fetcher;
mod lookup;
mod mutation;
mod options;
mod render;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{total_pages_for, Page, PageCache, PageState};
pub use column::{derive_columns, derive_header, Column, ColumnOverride, ACTIONS_KEY};
pub use fetcher::{DataFetcher, LoadingIndicator, PageData};
pub use mutation::MutationOutcome;
pub use options::{
  resolve, Action, CallbackOptions, CallbackPolicy, Callbacks, ColumnWidthMethod, CreateMethod,
  DeleteMethod, DisplayMode, ExternalCallback, GridConfig, GridOptions, InsertAt, LogLevel,
  PaginationMethod, PaginationMode, Styles, UpdateMethod,
};
pub use render::{PaginationControls, Renderer};
pub use worker::GridHandle;

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::collections::VecDeque;
use tracing::error;

/// A single row: field name to JSON value, in the order the API sent them
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A page the paginator wants in the cache without showing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PrefetchTask {
  index: usize,
}

pub struct Grid<R: Renderer> {
  config: GridConfig,
  columns: Vec<Column>,
  fetcher: DataFetcher,
  cache: PageCache,
  renderer: R,
}

impl<R: Renderer> Grid<R> {
  /// Resolve options, fetch page 0, derive columns, render the grid and show page 0.
  ///
  /// Any failure is logged and returned before the renderer is touched.
  pub async fn init(element: &str, api_url: &str, options: GridOptions, renderer: R) -> Result<Self> {
    Self::try_init(element, api_url, options, renderer)
      .await
      .inspect_err(|e| error!(grid = element, "Initialization failed: {}", e))
  }

  async fn try_init(
    element: &str,
    api_url: &str,
    options: GridOptions,
    renderer: R,
  ) -> Result<Self> {
    let config = resolve(element, api_url, options)?;
    grid_debug!(config.log_level, grid = element, config = ?config, "Configuration set");

    let mut grid = Self {
      fetcher: DataFetcher::new(&config),
      config,
      columns: Vec::new(),
      cache: PageCache::new(),
      renderer,
    };

    grid.fetch_page(0, true).await;
    let first = grid
      .cache
      .get(0)
      .ok_or_else(|| eyre!("Data for page 0 could not be retrieved"))?;
    if first.data.count == 0 {
      return Err(eyre!("Data count for page 0 is 0"));
    }
    let Some(first_record) = first.data.result.first() else {
      return Err(eyre!("Data result for page 0 is empty"));
    };

    grid.columns = derive_columns(first_record, &grid.config);
    grid_debug!(
      grid.config.log_level,
      grid = %grid.config.element,
      columns = grid.columns.len(),
      "Columns calculated"
    );

    grid.renderer.render_grid(&grid.columns, &grid.config);
    grid.page_to(0).await;
    grid_info!(grid.config.log_level, grid = %grid.config.element, "Grid initialized");

    Ok(grid)
  }

  pub fn config(&self) -> &GridConfig {
    &self.config
  }

  pub fn columns(&self) -> &[Column] {
    &self.columns
  }

  pub fn cache(&self) -> &PageCache {
    &self.cache
  }

  pub fn renderer(&self) -> &R {
    &self.renderer
  }

  pub fn current_page_index(&self) -> usize {
    self.cache.current_page_index()
  }

  pub fn total_pages(&self) -> usize {
    self.cache.total_pages()
  }

  /// Show page `index`, fetching it if needed.
  ///
  /// Returns false, leaving the current page and the rendered rows untouched,
  /// when the page cannot be fetched.
  pub async fn page_to(&mut self, index: usize) -> bool {
    match self.cache.get(index) {
      Some(page) => grid_debug!(
        self.config.log_level,
        grid = %self.config.element,
        page = index,
        age_secs = page.age(Utc::now()).num_seconds(),
        "Serving cached page"
      ),
      None => {
        self.fetch_page(index, true).await;
      }
    }

    let Some(page) = self.cache.get(index) else {
      error!(grid = %self.config.element, page = index, "Page data not found");
      return false;
    };
    let count = page.data.count;
    self.renderer.render_page(page);

    self.cache.set_current_page_index(index);
    let total_pages = total_pages_for(count, self.config.page_size);
    self.cache.set_total_pages(total_pages);
    if self.config.use_pagination {
      self
        .renderer
        .render_pagination(&PaginationControls::new(index, total_pages, count));
    }

    if !self.config.use_caching {
      self.cache.keep_only(index);
      return true;
    }

    grid_debug!(
      self.config.log_level,
      grid = %self.config.element,
      page = index,
      "Removing pages outside the pagination window"
    );
    self.cache.retain_window(index);

    if self.config.use_predictive_caching {
      let tasks = self.prefetch_plan(index);
      self.run_prefetch(tasks).await;
    }
    true
  }

  /// Drop the whole cache and the write counter, then reload the current page
  pub async fn refresh(&mut self) -> bool {
    self.cache.clear();
    let index = self.cache.current_page_index();
    self.page_to(index).await
  }

  /// Fetch `index` into the cache. Failures are logged and leave the cache as it was.
  async fn fetch_page(&mut self, index: usize, show_loading: bool) -> bool {
    let prior = self.cache.begin_fetch(index);
    match self.fetcher.fetch(index, show_loading).await {
      Ok(data) => {
        self
          .cache
          .store(Page::new(index, data), self.config.use_caching);
        true
      }
      Err(e) => {
        error!(grid = %self.config.element, page = index, "Error retrieving data: {}", e);
        self.cache.fetch_failed(index, prior);
        false
      }
    }
  }

  /// Boundary and neighbour pages still missing after showing `index`, in fetch order
  fn prefetch_plan(&self, index: usize) -> VecDeque<PrefetchTask> {
    let total = self.cache.total_pages();
    let mut candidates = vec![0];
    if let Some(last) = total.checked_sub(1) {
      candidates.push(last);
    }
    if index > 0 {
      candidates.push(index - 1);
    }
    if index + 1 < total {
      candidates.push(index + 1);
    }

    let mut plan = VecDeque::new();
    for candidate in candidates {
      let task = PrefetchTask { index: candidate };
      if !self.cache.contains(candidate) && !plan.contains(&task) {
        plan.push_back(task);
      }
    }
    plan
  }

  /// Run prefetches one at a time, in order. Nothing here is cancelled or retried.
  async fn run_prefetch(&mut self, mut tasks: VecDeque<PrefetchTask>) {
    grid_debug!(
      self.config.log_level,
      grid = %self.config.element,
      pending = tasks.len(),
      "Fetching predictive pages"
    );
    while let Some(task) = tasks.pop_front() {
      if self.cache.contains(task.index) {
        continue;
      }
      self.fetch_page(task.index, false).await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::{
    LogCapture, MemoryTransport, RecordingIndicator, RecordingRenderer, RenderCall,
  };
  use super::*;
  use serde_json::json;
  use std::sync::Arc;

  const URL: &str = "http://localhost/items";

  async fn grid_with(
    transport: &Arc<MemoryTransport>,
    options: GridOptions,
  ) -> Grid<RecordingRenderer> {
    let options = options.with_api_caller(transport.clone());
    Grid::init("items", URL, options, RecordingRenderer::default())
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn test_init_renders_grid_then_first_page() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let grid = grid_with(&transport, GridOptions::default()).await;

    let calls = grid.renderer().calls();
    assert!(matches!(calls[0], RenderCall::Grid(_)));
    assert_eq!(calls[1], RenderCall::Page { index: 0, ids: (1..=10).collect() });
    assert_eq!(
      calls[2],
      RenderCall::Pagination(PaginationControls::new(0, 10, 95))
    );
    assert_eq!(grid.current_page_index(), 0);
    assert_eq!(grid.total_pages(), 10);
    assert_eq!(transport.requested(), vec![0]);
  }

  #[tokio::test]
  async fn test_init_fails_without_data() {
    let transport = Arc::new(MemoryTransport::with_records(0));
    let options = GridOptions::default().with_api_caller(transport.clone());
    let renderer = RecordingRenderer::default();
    let log = renderer.log();

    assert!(Grid::init("items", URL, options, renderer).await.is_err());
    assert!(log.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_init_fails_when_first_fetch_fails() {
    let transport = Arc::new(MemoryTransport::with_records(30));
    transport.fail_page(0);
    let options = GridOptions::default().with_api_caller(transport.clone());

    assert!(Grid::init("items", URL, options, RecordingRenderer::default())
      .await
      .is_err());
  }

  #[tokio::test]
  async fn test_init_fails_without_element_or_api() {
    let transport = Arc::new(MemoryTransport::with_records(30));
    let options = GridOptions::default().with_api_caller(transport.clone());
    assert!(Grid::init("", URL, options.clone(), RecordingRenderer::default())
      .await
      .is_err());
    assert!(Grid::init("items", "", options, RecordingRenderer::default())
      .await
      .is_err());
    assert!(transport.requested().is_empty());
  }

  #[tokio::test]
  async fn test_page_to_caches_and_moves_current() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, GridOptions::default()).await;

    assert!(grid.page_to(3).await);
    assert_eq!(grid.current_page_index(), 3);
    assert!(grid.cache().contains(3));
    assert_eq!(
      grid.renderer().calls().last(),
      Some(&RenderCall::Pagination(PaginationControls::new(3, 10, 95)))
    );
  }

  #[tokio::test]
  async fn test_cached_page_is_not_refetched() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, GridOptions::default()).await;

    grid.page_to(1).await;
    grid.page_to(0).await;
    grid.page_to(1).await;
    assert_eq!(transport.requested(), vec![0, 1]);
  }

  #[tokio::test]
  async fn test_cache_stays_within_window() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, GridOptions::default()).await;

    for i in [1, 2, 3, 4, 5, 9, 8, 7] {
      assert!(grid.page_to(i).await);
      let allowed = [0, 9, i - 1, i, i + 1];
      assert!(
        grid.cache().indices().iter().all(|x| allowed.contains(x)),
        "page {} left {:?}",
        i,
        grid.cache().indices()
      );
    }
    assert_eq!(grid.cache().state(3), PageState::Evicted);
  }

  #[tokio::test]
  async fn test_without_caching_only_shown_page_is_kept() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let options = GridOptions {
      use_caching: Some(false),
      ..Default::default()
    };
    let mut grid = grid_with(&transport, options).await;
    assert_eq!(grid.cache().indices(), vec![0]);

    for i in [4, 5, 0, 9] {
      grid.page_to(i).await;
      assert_eq!(grid.cache().indices(), vec![i]);
    }
    grid.page_to(5).await;
    assert_eq!(transport.requested(), vec![0, 4, 5, 0, 9, 5]);
  }

  #[tokio::test]
  async fn test_failed_navigation_keeps_state() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, GridOptions::default()).await;
    grid.page_to(1).await;
    let rendered = grid.renderer().calls().len();
    let cached = grid.cache().indices();

    transport.fail_page(2);
    assert!(!grid.page_to(2).await);
    assert_eq!(grid.current_page_index(), 1);
    assert_eq!(grid.cache().indices(), cached);
    assert_eq!(grid.cache().state(2), PageState::Unfetched);
    assert_eq!(grid.renderer().calls().len(), rendered);
  }

  #[tokio::test]
  async fn test_predictive_caching_fills_window_quietly() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let indicator = Arc::new(RecordingIndicator::default());
    let options = GridOptions {
      use_predictive_caching: Some(true),
      ..Default::default()
    }
    .with_loading_controls(indicator.clone());
    let mut grid = grid_with(&transport, options).await;

    // page 0 shown: 9 (last) and 1 (next) prefetched
    assert_eq!(transport.requested(), vec![0, 9, 1]);

    grid.page_to(5).await;
    assert_eq!(transport.requested(), vec![0, 9, 1, 5, 4, 6]);
    let mut cached = grid.cache().indices();
    cached.sort();
    assert_eq!(cached, vec![0, 4, 5, 6, 9]);

    let shows = indicator
      .calls()
      .iter()
      .filter(|c| c.starts_with("show"))
      .count();
    assert_eq!(shows, 2);
  }

  #[tokio::test]
  async fn test_prefetch_failure_is_ignored() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    transport.fail_page(9);
    let options = GridOptions {
      use_predictive_caching: Some(true),
      ..Default::default()
    };
    let mut grid = grid_with(&transport, options).await;

    assert!(grid.page_to(4).await);
    assert_eq!(grid.current_page_index(), 4);
    assert!(!grid.cache().contains(9));
    assert!(grid.cache().contains(3));
    assert!(grid.cache().contains(5));
  }

  #[tokio::test]
  async fn test_refresh_refetches_current_page() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, GridOptions::default()).await;
    grid.page_to(2).await;

    transport.set_field(25, "name", json!("Renamed"));
    assert!(grid.refresh().await);

    assert_eq!(transport.requested(), vec![0, 2, 2]);
    assert_eq!(grid.cache().indices(), vec![2]);
    assert_eq!(grid.cache().data_writes(), 0);
    let page = grid.cache().get(2).unwrap();
    assert_eq!(page.data.result[4]["name"], json!("Renamed"));
  }

  #[tokio::test]
  async fn test_pagination_not_rendered_when_disabled() {
    let transport = Arc::new(MemoryTransport::with_records(95));
    let options = GridOptions {
      use_pagination: Some(false),
      ..Default::default()
    };
    let mut grid = grid_with(&transport, options).await;
    grid.page_to(1).await;

    assert!(grid
      .renderer()
      .calls()
      .iter()
      .all(|c| !matches!(c, RenderCall::Pagination(_))));
    assert_eq!(transport.last_request().unwrap()["usePagination"], json!(false));
  }

  fn with_log_level(level: &str) -> GridOptions {
    GridOptions {
      log_level: Some(level.to_string()),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn test_error_log_level_silences_engine_chatter() {
    let capture = LogCapture::default();
    let _guard = capture.install();

    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, with_log_level("error")).await;
    assert!(grid.page_to(3).await);
    assert!(grid.page_to(3).await);
    assert!(capture.lines().is_empty(), "{:?}", capture.lines());

    transport.fail_page(5);
    assert!(!grid.page_to(5).await);
    let lines = capture.lines();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.contains("ERROR")), "{:?}", lines);
    assert!(lines.iter().any(|l| l.contains("Error retrieving data")));
  }

  #[tokio::test]
  async fn test_debug_log_level_reports_paging() {
    let capture = LogCapture::default();
    let _guard = capture.install();

    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, with_log_level("debug")).await;
    grid.page_to(3).await;
    grid.page_to(3).await;

    let lines = capture.lines();
    let logged = |message: &str| lines.iter().any(|l| l.contains(message));
    assert!(logged("Debug logging enabled"));
    assert!(logged("Getting data"));
    assert!(logged("Grid initialized"));
    assert!(logged("Removing pages outside the pagination window"));
    assert!(logged("Serving cached page"));
  }

  #[tokio::test]
  async fn test_info_log_level_keeps_info_drops_debug() {
    let capture = LogCapture::default();
    let _guard = capture.install();

    let transport = Arc::new(MemoryTransport::with_records(95));
    let mut grid = grid_with(&transport, with_log_level("info")).await;
    grid.page_to(1).await;

    let lines = capture.lines();
    assert!(lines.iter().any(|l| l.contains("Grid initialized")));
    assert!(lines.iter().all(|l| !l.contains("DEBUG")), "{:?}", lines);
  }
}
