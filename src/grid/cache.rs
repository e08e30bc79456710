//! Bounded page cache and the per-page lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use super::fetcher::PageData;
use super::Record;

/// One fetched batch of records, keyed by zero-based index
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
  pub index: usize,
  pub data: PageData,
  pub fetched_at: DateTime<Utc>,
}

impl Page {
  pub fn new(index: usize, data: PageData) -> Self {
    Self {
      index,
      data,
      fetched_at: Utc::now(),
    }
  }

  /// How long ago the page was fetched, as of `now`
  pub fn age(&self, now: DateTime<Utc>) -> Duration {
    now - self.fetched_at
  }

  pub fn position_of(&self, primary_key: &str, key: &Value) -> Option<usize> {
    self
      .data
      .result
      .iter()
      .position(|r| r.get(primary_key) == Some(key))
  }
}

/// Lifecycle of a page index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
  Unfetched,
  Fetching,
  Cached,
  /// Dropped by the retention window
  Evicted,
  /// Dropped by a refresh or a write
  Invalidated,
}

/// `ceil(count / page_size)`
pub fn total_pages_for(count: u64, page_size: usize) -> usize {
  if page_size == 0 {
    return 0;
  }
  count.div_ceil(page_size as u64) as usize
}

/// Cached pages plus the navigation state that goes with them.
///
/// Holds at most one page per index. Pages keep insertion order, which is the
/// order update lookups walk them in.
#[derive(Debug, Default)]
pub struct PageCache {
  pages: Vec<Page>,
  states: BTreeMap<usize, PageState>,
  current_page_index: usize,
  total_pages: usize,
  data_writes: u64,
}

impl PageCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pages(&self) -> &[Page] {
    &self.pages
  }

  pub fn indices(&self) -> Vec<usize> {
    self.pages.iter().map(|p| p.index).collect()
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  pub fn contains(&self, index: usize) -> bool {
    self.pages.iter().any(|p| p.index == index)
  }

  pub fn get(&self, index: usize) -> Option<&Page> {
    self.pages.iter().find(|p| p.index == index)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut Page> {
    self.pages.iter_mut().find(|p| p.index == index)
  }

  pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
    self.pages.iter_mut()
  }

  pub fn current_page(&self) -> Option<&Page> {
    self.get(self.current_page_index)
  }

  pub fn current_page_mut(&mut self) -> Option<&mut Page> {
    let index = self.current_page_index;
    self.get_mut(index)
  }

  pub fn current_page_index(&self) -> usize {
    self.current_page_index
  }

  pub fn set_current_page_index(&mut self, index: usize) {
    self.current_page_index = index;
  }

  pub fn total_pages(&self) -> usize {
    self.total_pages
  }

  pub fn set_total_pages(&mut self, total_pages: usize) {
    self.total_pages = total_pages;
  }

  pub fn data_writes(&self) -> u64 {
    self.data_writes
  }

  pub fn record_write(&mut self) -> u64 {
    self.data_writes += 1;
    self.data_writes
  }

  pub fn state(&self, index: usize) -> PageState {
    self
      .states
      .get(&index)
      .copied()
      .unwrap_or(PageState::Unfetched)
  }

  /// Mark `index` as in flight, returning the state to restore if the fetch fails
  pub fn begin_fetch(&mut self, index: usize) -> PageState {
    let prior = self.state(index);
    self.states.insert(index, PageState::Fetching);
    prior
  }

  pub fn fetch_failed(&mut self, index: usize, prior: PageState) {
    self.states.insert(index, prior);
  }

  /// Store a fetched page. With `retain_others` the page joins the cache
  /// (replacing any page with the same index); without it, it becomes the only page.
  pub fn store(&mut self, page: Page, retain_others: bool) {
    let index = page.index;
    if retain_others {
      match self.pages.iter_mut().find(|p| p.index == index) {
        Some(existing) => *existing = page,
        None => self.pages.push(page),
      }
    } else {
      self.drop_where(|p| p.index != index, PageState::Evicted);
      self.pages.clear();
      self.pages.push(page);
    }
    self.states.insert(index, PageState::Cached);
  }

  /// Keep page 0, the last page and the neighbourhood of `index`
  pub fn retain_window(&mut self, index: usize) {
    let last = self.total_pages.checked_sub(1);
    self.drop_where(
      |p| {
        let keep = p.index == 0
          || Some(p.index) == last
          || (p.index + 1 >= index && p.index <= index + 1);
        !keep
      },
      PageState::Evicted,
    );
  }

  /// Keep only the page at `index`
  pub fn keep_only(&mut self, index: usize) {
    self.drop_where(|p| p.index != index, PageState::Evicted);
  }

  /// Invalidate everything except the current page
  pub fn collapse_to_current(&mut self) {
    let current = self.current_page_index;
    self.drop_where(|p| p.index != current, PageState::Invalidated);
  }

  /// Drop every page and reset the write counter
  pub fn clear(&mut self) {
    self.drop_where(|_| true, PageState::Invalidated);
    self.data_writes = 0;
  }

  /// First cached record whose `primary_key` field equals `key`
  pub fn find_record(&self, primary_key: &str, key: &Value) -> Option<&Record> {
    self
      .pages
      .iter()
      .flat_map(|p| p.data.result.iter())
      .find(|r| r.get(primary_key) == Some(key))
  }

  fn drop_where(&mut self, mut predicate: impl FnMut(&Page) -> bool, state: PageState) {
    let states = &mut self.states;
    self.pages.retain(|p| {
      let drop = predicate(p);
      if drop {
        states.insert(p.index, state);
      }
      !drop
    });
  }
}
