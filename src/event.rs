use chrono::{DateTime, Utc};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use gridpager::grid::{Column, ColumnWidthMethod, InsertAt, PaginationControls};
use gridpager::Record;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output of the grid engine, as seen by the UI
#[derive(Debug, Clone)]
pub enum GridEvent {
  /// Columns are known; the grid skeleton can be laid out
  Layout {
    columns: Vec<Column>,
    width_method: ColumnWidthMethod,
    actions: Vec<String>,
  },
  /// Replace the visible rows
  Page {
    index: usize,
    rows: Vec<Record>,
    fetched_at: DateTime<Utc>,
  },
  RowInserted {
    record: Record,
    at: InsertAt,
    styles: String,
  },
  RowReplaced {
    key: Value,
    record: Record,
    styles: String,
  },
  RowRemoved { key: Value },
  Pagination(PaginationControls),
  /// `Some(message)` while a page is loading, `None` once it finished
  Loading(Option<String>),
}

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh
  Tick,
  Grid(GridEvent),
  /// Answer to a record lookup; `None` when the record is not cached
  RecordLoaded(Option<Record>),
  Error(String),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let terminal_tx = tx.clone();
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(CrosstermEvent::Key(key)) = event::read() {
            if terminal_tx.send(Event::Key(key)).is_err() {
              break;
            }
          }
        } else if terminal_tx.send(Event::Tick).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender for tasks that report back into the event loop
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
