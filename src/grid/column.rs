//! Column metadata derived from the shape of the first fetched record.

use convert_case::{Case, Casing};
use serde::Deserialize;

use super::options::{ColumnWidthMethod, GridConfig};
use super::Record;

/// Key of the synthetic column that holds row actions
pub const ACTIONS_KEY: &str = "actions";

/// User override for a derived column, matched by `key`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnOverride {
  pub key: String,
  pub header: Option<String>,
  pub hidden: Option<bool>,
  pub width: Option<String>,
  pub order: Option<usize>,
  pub on_click: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
  pub key: String,
  pub header: String,
  pub hidden: bool,
  pub width: Option<String>,
  pub order: usize,
  pub on_click: Option<String>,
  pub primary_key: bool,
}

impl Column {
  pub fn is_actions(&self) -> bool {
    self.key == ACTIONS_KEY
  }

  /// Width the renderer should apply under `method`, given how many columns are visible
  pub fn effective_width(&self, method: ColumnWidthMethod, visible: usize) -> Option<String> {
    let even = || format!("{:.2}%", 100.0 / visible.max(1) as f64);
    match method {
      ColumnWidthMethod::Auto => None,
      ColumnWidthMethod::Even if self.is_actions() => None,
      ColumnWidthMethod::Even => Some(even()),
      ColumnWidthMethod::EvenConfigOverride => Some(self.width.clone().unwrap_or_else(even)),
    }
  }
}

/// Human header for a raw field name: `firstName` and `first_name` both become `First Name`
pub fn derive_header(key: &str) -> String {
  key.to_case(Case::Title)
}

/// Fields ending in "id" (but not "id" itself) are foreign keys and start hidden
fn hidden_by_default(key: &str) -> bool {
  let lower = key.to_lowercase();
  lower != "id" && lower.ends_with("id")
}

/// Build the column list from the first record, applying overrides by key.
pub fn derive_columns(first: &Record, config: &GridConfig) -> Vec<Column> {
  let find_override = |key: &str| config.column_overrides.iter().find(|c| c.key == key);

  let mut columns: Vec<Column> = first
    .keys()
    .enumerate()
    .map(|(position, key)| {
      let user = find_override(key);
      Column {
        key: key.clone(),
        header: user
          .and_then(|c| c.header.clone())
          .unwrap_or_else(|| derive_header(key)),
        hidden: user
          .and_then(|c| c.hidden)
          .unwrap_or_else(|| hidden_by_default(key)),
        width: user.and_then(|c| c.width.clone()),
        order: user.and_then(|c| c.order).unwrap_or(position),
        on_click: user.and_then(|c| c.on_click.clone()),
        primary_key: config.primary_key.as_deref() == Some(key.as_str()),
      }
    })
    .collect();

  // Stable, so ties keep field order
  columns.sort_by_key(|c| c.order);

  if config.actions.is_some() {
    let user = find_override(ACTIONS_KEY);
    let order = columns.iter().map(|c| c.order + 1).max().unwrap_or(0);
    columns.push(Column {
      key: ACTIONS_KEY.to_string(),
      header: user
        .and_then(|c| c.header.clone())
        .unwrap_or_else(|| "Actions".to_string()),
      hidden: false,
      width: user.and_then(|c| c.width.clone()),
      order,
      on_click: None,
      primary_key: false,
    });
  }

  columns
}
