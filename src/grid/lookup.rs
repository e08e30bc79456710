use serde_json::Value;
use tracing::error;

use super::{Grid, Record, Renderer};

impl<R: Renderer> Grid<R> {
  /// Cache-only lookup by primary key. Uncached pages are never fetched.
  pub fn get_record(&self, key: &Value) -> Option<&Record> {
    grid_debug!(self.config.log_level, grid = %self.config.element, key = %key, "Getting record");

    let Some(primary_key) = self.config.primary_key.as_deref() else {
      error!(grid = %self.config.element, "No primary key configured");
      return None;
    };

    let record = self.cache.find_record(primary_key, key);
    if record.is_none() {
      error!(grid = %self.config.element, key = %key, "Record not found");
    }
    record
  }

  /// Set `update_key = update_value` on every cached record whose `filter_key`
  /// equals `filter_value`. Returns how many records changed.
  pub async fn update_column_where(
    &mut self,
    filter_key: &str,
    filter_value: &Value,
    update_key: &str,
    update_value: Value,
    re_render: bool,
  ) -> usize {
    grid_debug!(
      self.config.log_level,
      grid = %self.config.element,
      filter_key, filter_value = %filter_value, update_key, update_value = %update_value,
      "Updating column"
    );

    let mut updated = 0;
    for page in self.cache.pages_mut() {
      for record in page.data.result.iter_mut() {
        if record.get(filter_key) == Some(filter_value) {
          record.insert(update_key.to_string(), update_value.clone());
          updated += 1;
        }
      }
    }

    if re_render {
      let index = self.cache.current_page_index();
      self.page_to(index).await;
    }
    updated
  }
}
