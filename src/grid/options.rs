//! Grid options as supplied by the user, and the immutable config resolved from them.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{error, warn};

use super::column::ColumnOverride;
use super::fetcher::LoadingIndicator;
use super::Record;
use crate::transport::{HttpTransport, RequestFormat, RequestVerb, Transport};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Style keys seeded with an empty class list
pub const STYLE_KEYS: &[&str] = &[
  "container",
  "table",
  "thead",
  "thead_tr",
  "thead_tr_th",
  "tbody",
  "tbody_tr",
  "tbody_tr_td",
  "tfoot",
  "tfoot_tr",
  "tfoot_tr_td",
  "actions",
  "actions_btn",
  "pagination_btn",
  "pagination_btn_active",
  "pagination_btn_inactive",
];

/// Cumulative log verbosity: each level includes the ones before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  #[default]
  Error,
  Warning,
  Info,
  Debug,
}

impl LogLevel {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "error" => Some(LogLevel::Error),
      "warning" | "warn" => Some(LogLevel::Warning),
      "info" => Some(LogLevel::Info),
      "debug" => Some(LogLevel::Debug),
      _ => None,
    }
  }

  pub fn enables(self, level: LogLevel) -> bool {
    level <= self
  }

  pub fn level_filter(self) -> LevelFilter {
    match self {
      LogLevel::Error => LevelFilter::ERROR,
      LogLevel::Warning => LevelFilter::WARN,
      LogLevel::Info => LevelFilter::INFO,
      LogLevel::Debug => LevelFilter::DEBUG,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnWidthMethod {
  /// Let the renderer size columns
  #[default]
  Auto,
  /// Split the width evenly across visible data columns
  Even,
  /// Even split, unless a column declares its own width
  EvenConfigOverride,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
  #[default]
  Table,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
  /// Each navigation replaces the visible rows
  #[default]
  Replace,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMethod {
  #[default]
  Button,
}

/// Where a created record lands in the current page
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsertAt {
  #[default]
  Top,
  Bottom,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreateMethod {
  #[default]
  None,
  Insert,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMethod {
  #[default]
  None,
  Replace,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMethod {
  #[default]
  None,
  Remove,
}

/// Side-effect hook run after a mutation callback; its result is ignored
pub type ExternalCallback = Arc<dyn Fn(&Record) + Send + Sync>;

/// How one kind of mutation is reconciled with the cache and the rendered rows.
///
/// `insert_method` is only read by create.
#[derive(Clone, Default, Deserialize)]
#[serde(default, bound(deserialize = "M: Deserialize<'de> + Default"))]
pub struct CallbackPolicy<M> {
  pub method: M,
  pub insert_method: InsertAt,
  /// Extra style applied to rows produced by this callback
  pub styles: String,
  #[serde(skip)]
  pub external_callback: Option<ExternalCallback>,
}

impl<M: fmt::Debug> fmt::Debug for CallbackPolicy<M> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CallbackPolicy")
      .field("method", &self.method)
      .field("insert_method", &self.insert_method)
      .field("styles", &self.styles)
      .field("external_callback", &self.external_callback.is_some())
      .finish()
  }
}

#[derive(Debug, Clone, Default)]
pub struct Callbacks {
  pub create: CallbackPolicy<CreateMethod>,
  pub update: CallbackPolicy<UpdateMethod>,
  pub delete: CallbackPolicy<DeleteMethod>,
}

/// User-supplied callback policies; omitted operations keep their defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CallbackOptions {
  pub create: Option<CallbackPolicy<CreateMethod>>,
  pub update: Option<CallbackPolicy<UpdateMethod>>,
  pub delete: Option<CallbackPolicy<DeleteMethod>>,
}

/// A per-row action, shown in the synthetic actions column
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Action {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub icon: String,
  #[serde(default)]
  pub styles: String,
  #[serde(default)]
  pub on_click: String,
}

/// Style classes keyed by element; unknown keys pass through untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styles(BTreeMap<String, String>);

impl Default for Styles {
  fn default() -> Self {
    Self(
      STYLE_KEYS
        .iter()
        .map(|k| (k.to_string(), String::new()))
        .collect(),
    )
  }
}

impl Styles {
  /// Overlay user styles key by key, keeping defaults for keys not mentioned
  pub fn merge(&mut self, overrides: BTreeMap<String, String>) {
    self.0.extend(overrides);
  }

  pub fn get(&self, key: &str) -> &str {
    self.0.get(key).map(String::as_str).unwrap_or("")
  }
}

/// Partial grid configuration as written by the user.
///
/// Every field is optional; [`resolve`] fills the gaps with defaults. Transport,
/// loading controls and external callbacks are code, not data, so they are set
/// with the builder methods rather than deserialized.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridOptions {
  pub page_size: Option<usize>,
  pub use_pagination: Option<bool>,
  pub use_caching: Option<bool>,
  pub use_predictive_caching: Option<bool>,
  pub invalidate_cache_on_data_write: Option<bool>,
  pub columns: Vec<ColumnOverride>,
  pub column_width_method: Option<ColumnWidthMethod>,
  pub actions: Option<Vec<Action>>,
  pub api_params: Map<String, Value>,
  pub api_request_format: Option<RequestFormat>,
  pub api_request_verb: Option<RequestVerb>,
  #[serde(skip)]
  pub api_caller: Option<Arc<dyn Transport>>,
  pub callbacks: CallbackOptions,
  #[serde(skip)]
  pub loading_controls: Option<Arc<dyn LoadingIndicator>>,
  pub primary_key: Option<String>,
  pub display_mode: Option<DisplayMode>,
  pub pagination_mode: Option<PaginationMode>,
  pub pagination_method: Option<PaginationMethod>,
  pub styles: BTreeMap<String, String>,
  pub log_level: Option<String>,
}

impl GridOptions {
  pub fn with_api_caller(mut self, transport: Arc<dyn Transport>) -> Self {
    self.api_caller = Some(transport);
    self
  }

  pub fn with_loading_controls(mut self, indicator: Arc<dyn LoadingIndicator>) -> Self {
    self.loading_controls = Some(indicator);
    self
  }

  pub fn on_create(mut self, callback: ExternalCallback) -> Self {
    self
      .callbacks
      .create
      .get_or_insert_with(Default::default)
      .external_callback = Some(callback);
    self
  }

  pub fn on_update(mut self, callback: ExternalCallback) -> Self {
    self
      .callbacks
      .update
      .get_or_insert_with(Default::default)
      .external_callback = Some(callback);
    self
  }

  pub fn on_delete(mut self, callback: ExternalCallback) -> Self {
    self
      .callbacks
      .delete
      .get_or_insert_with(Default::default)
      .external_callback = Some(callback);
    self
  }
}

impl fmt::Debug for GridOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GridOptions")
      .field("page_size", &self.page_size)
      .field("use_pagination", &self.use_pagination)
      .field("use_caching", &self.use_caching)
      .field("use_predictive_caching", &self.use_predictive_caching)
      .field("primary_key", &self.primary_key)
      .field("log_level", &self.log_level)
      .finish_non_exhaustive()
  }
}

/// Resolved configuration. Built once by [`resolve`] and never mutated afterwards.
#[derive(Clone)]
pub struct GridConfig {
  pub element: String,
  pub api_url: String,
  pub page_size: usize,
  pub use_pagination: bool,
  pub use_caching: bool,
  pub use_predictive_caching: bool,
  pub invalidate_cache_on_data_write: bool,
  pub column_overrides: Vec<ColumnOverride>,
  pub column_width_method: ColumnWidthMethod,
  pub actions: Option<Vec<Action>>,
  pub api_params: Map<String, Value>,
  pub api_request_format: RequestFormat,
  pub api_request_verb: RequestVerb,
  pub api_caller: Arc<dyn Transport>,
  pub callbacks: Callbacks,
  pub loading_controls: Option<Arc<dyn LoadingIndicator>>,
  pub primary_key: Option<String>,
  // The next four are resolved for renderers, which get them through
  // `Renderer::render_grid`. The engine behaves the same for every value:
  // each closed enum has a single variant and styles are opaque class lists.
  pub display_mode: DisplayMode,
  pub pagination_mode: PaginationMode,
  pub pagination_method: PaginationMethod,
  pub styles: Styles,
  /// Gates the engine's own debug, info and warning events. Errors always go through.
  pub log_level: LogLevel,
}

impl fmt::Debug for GridConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GridConfig")
      .field("element", &self.element)
      .field("api_url", &self.api_url)
      .field("page_size", &self.page_size)
      .field("use_pagination", &self.use_pagination)
      .field("use_caching", &self.use_caching)
      .field("use_predictive_caching", &self.use_predictive_caching)
      .field(
        "invalidate_cache_on_data_write",
        &self.invalidate_cache_on_data_write,
      )
      .field("primary_key", &self.primary_key)
      .field("callbacks", &self.callbacks)
      .field("log_level", &self.log_level)
      .finish_non_exhaustive()
  }
}

/// Merge user options over defaults.
///
/// Fails when the element or API url is missing. An unknown log level or a zero
/// page size is reported and replaced by its default instead of failing.
pub fn resolve(element: &str, api_url: &str, options: GridOptions) -> Result<GridConfig> {
  if element.trim().is_empty() {
    return Err(eyre!("Element is required"));
  }
  if api_url.trim().is_empty() {
    return Err(eyre!("API is required"));
  }

  let log_level = match options.log_level.as_deref() {
    None => LogLevel::default(),
    Some(raw) => LogLevel::parse(raw).unwrap_or_else(|| {
      error!(
        grid = element,
        "Invalid log level {:?}. Defaulting to error. Valid log levels are error, warning, info, and debug.",
        raw
      );
      LogLevel::Error
    }),
  };
  if log_level == LogLevel::Debug {
    warn!(
      grid = element,
      "Debug logging enabled. This should not be enabled in production environments."
    );
  }

  let page_size = match options.page_size {
    Some(0) => {
      error!(
        grid = element,
        "Page size must be positive. Defaulting to {}.", DEFAULT_PAGE_SIZE
      );
      DEFAULT_PAGE_SIZE
    }
    Some(n) => n,
    None => DEFAULT_PAGE_SIZE,
  };

  let api_caller = match options.api_caller {
    Some(transport) => transport,
    None => Arc::new(HttpTransport::new()?),
  };

  let mut styles = Styles::default();
  styles.merge(options.styles);

  let callbacks = Callbacks {
    create: options.callbacks.create.unwrap_or_default(),
    update: options.callbacks.update.unwrap_or_default(),
    delete: options.callbacks.delete.unwrap_or_default(),
  };

  Ok(GridConfig {
    element: element.to_string(),
    api_url: api_url.to_string(),
    page_size,
    use_pagination: options.use_pagination.unwrap_or(true),
    use_caching: options.use_caching.unwrap_or(true),
    use_predictive_caching: options.use_predictive_caching.unwrap_or(false),
    invalidate_cache_on_data_write: options.invalidate_cache_on_data_write.unwrap_or(false),
    column_overrides: options.columns,
    column_width_method: options.column_width_method.unwrap_or_default(),
    actions: options.actions,
    api_params: options.api_params,
    api_request_format: options.api_request_format.unwrap_or_default(),
    api_request_verb: options.api_request_verb.unwrap_or_default(),
    api_caller,
    callbacks,
    loading_controls: options.loading_controls,
    primary_key: options.primary_key,
    display_mode: options.display_mode.unwrap_or_default(),
    pagination_mode: options.pagination_mode.unwrap_or_default(),
    pagination_method: options.pagination_method.unwrap_or_default(),
    styles,
    log_level,
  })
}
