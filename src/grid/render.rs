//! The output side of the grid.
//!
//! The engine never builds markup or widgets. It hands structured data to a
//! [`Renderer`] and asks it for the smallest change that keeps the view in step
//! with the cache: a full page render on navigation, single-row operations on
//! mutations.

use serde_json::Value;

use super::cache::Page;
use super::column::Column;
use super::options::{GridConfig, InsertAt};
use super::Record;

pub trait Renderer: Send {
  /// Lay out the grid skeleton once columns are known
  fn render_grid(&mut self, columns: &[Column], config: &GridConfig);

  /// Replace the visible rows with this page's records
  fn render_page(&mut self, page: &Page);

  /// Add one row at the top or bottom of the visible rows
  fn insert_row(&mut self, record: &Record, at: InsertAt, styles: &str);

  /// Swap the visible row whose primary key is `key`
  fn replace_row(&mut self, key: &Value, record: &Record, styles: &str);

  /// Drop the visible row whose primary key is `key`
  fn remove_row(&mut self, key: &Value);

  fn render_pagination(&mut self, controls: &PaginationControls);
}

/// State of the pagination controls after a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
  pub current_page_index: usize,
  pub total_pages: usize,
  pub total_records: u64,
}

impl PaginationControls {
  pub fn new(current_page_index: usize, total_pages: usize, total_records: u64) -> Self {
    Self {
      current_page_index,
      total_pages,
      total_records,
    }
  }

  /// First and previous are disabled together
  pub fn back_disabled(&self) -> bool {
    self.current_page_index == 0
  }

  /// Next and last are disabled together
  pub fn forward_disabled(&self) -> bool {
    self.current_page_index + 1 >= self.total_pages
  }

  /// One-based number shown as the current page
  pub fn current_label(&self) -> usize {
    self.current_page_index + 1
  }

  pub fn previous_page(&self) -> Option<usize> {
    (!self.back_disabled()).then(|| self.current_page_index - 1)
  }

  pub fn next_page(&self) -> Option<usize> {
    (!self.forward_disabled()).then(|| self.current_page_index + 1)
  }

  pub fn last_page(&self) -> usize {
    self.total_pages.saturating_sub(1)
  }

  pub fn info(&self) -> String {
    format!(
      "Page {} of {} ({} items)",
      self.current_label(),
      self.total_pages,
      self.total_records
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_first_page_disables_back_only() {
    let controls = PaginationControls::new(0, 10, 95);
    assert!(controls.back_disabled());
    assert!(!controls.forward_disabled());
    assert_eq!(controls.previous_page(), None);
    assert_eq!(controls.next_page(), Some(1));
    assert_eq!(controls.current_label(), 1);
  }

  #[test]
  fn test_last_page_disables_forward_only() {
    let controls = PaginationControls::new(9, 10, 95);
    assert!(!controls.back_disabled());
    assert!(controls.forward_disabled());
    assert_eq!(controls.previous_page(), Some(8));
    assert_eq!(controls.last_page(), 9);
  }

  #[test]
  fn test_single_page_disables_everything() {
    let controls = PaginationControls::new(0, 1, 3);
    assert!(controls.back_disabled());
    assert!(controls.forward_disabled());
  }

  #[test]
  fn test_info_label() {
    assert_eq!(
      PaginationControls::new(4, 10, 95).info(),
      "Page 5 of 10 (95 items)"
    );
  }
}
