//! Engine-side sinks that forward grid output into the UI event loop.

use crate::event::{Event, GridEvent};
use gridpager::grid::{
  Column, GridConfig, InsertAt, LoadingIndicator, Page, PaginationControls, Renderer,
};
use gridpager::Record;
use serde_json::Value;
use tokio::sync::mpsc;

/// [`Renderer`] that turns every call into a [`GridEvent`]
pub struct ChannelRenderer {
  tx: mpsc::UnboundedSender<Event>,
}

impl ChannelRenderer {
  pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
    Self { tx }
  }

  fn send(&self, event: GridEvent) {
    // The UI is gone once the receiver is dropped
    let _ = self.tx.send(Event::Grid(event));
  }
}

impl Renderer for ChannelRenderer {
  fn render_grid(&mut self, columns: &[Column], config: &GridConfig) {
    let actions = config
      .actions
      .iter()
      .flatten()
      .map(|action| action.kind.clone())
      .collect();
    self.send(GridEvent::Layout {
      columns: columns.to_vec(),
      width_method: config.column_width_method,
      actions,
    });
  }

  fn render_page(&mut self, page: &Page) {
    self.send(GridEvent::Page {
      index: page.index,
      rows: page.data.result.clone(),
      fetched_at: page.fetched_at,
    });
  }

  fn insert_row(&mut self, record: &Record, at: InsertAt, styles: &str) {
    self.send(GridEvent::RowInserted {
      record: record.clone(),
      at,
      styles: styles.to_string(),
    });
  }

  fn replace_row(&mut self, key: &Value, record: &Record, styles: &str) {
    self.send(GridEvent::RowReplaced {
      key: key.clone(),
      record: record.clone(),
      styles: styles.to_string(),
    });
  }

  fn remove_row(&mut self, key: &Value) {
    self.send(GridEvent::RowRemoved { key: key.clone() });
  }

  fn render_pagination(&mut self, controls: &PaginationControls) {
    self.send(GridEvent::Pagination(*controls));
  }
}

/// [`LoadingIndicator`] shown in the table title
pub struct ChannelIndicator {
  tx: mpsc::UnboundedSender<Event>,
}

impl ChannelIndicator {
  pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
    Self { tx }
  }
}

impl LoadingIndicator for ChannelIndicator {
  fn show(&self, message: &str) {
    let _ = self
      .tx
      .send(Event::Grid(GridEvent::Loading(Some(message.to_string()))));
  }

  fn hide(&self) {
    let _ = self.tx.send(Event::Grid(GridEvent::Loading(None)));
  }
}
