use crate::event::GridEvent;
use crate::ui::renderfns::{cell_text, truncate, width_constraint};
use chrono::{DateTime, Local, Utc};
use gridpager::grid::{Column, ColumnWidthMethod, InsertAt, PaginationControls};
use gridpager::Record;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState as RowSelection};
use serde_json::Value;

const MAX_CELL_CHARS: usize = 48;

#[derive(Debug, Clone)]
struct GridRow {
  record: Record,
  /// Styles attached by a create or update; highlighted until the next page render
  styles: String,
}

/// What the terminal currently shows of the grid, rebuilt from [`GridEvent`]s
#[derive(Debug, Default)]
pub struct GridView {
  columns: Vec<Column>,
  width_method: ColumnWidthMethod,
  actions: Vec<String>,
  primary_key: Option<String>,
  page_index: Option<usize>,
  /// When the engine fetched the visible page; cached pages keep their original time
  fetched_at: Option<DateTime<Utc>>,
  rows: Vec<GridRow>,
  selected: usize,
  pagination: Option<PaginationControls>,
  loading: Option<String>,
}

impl GridView {
  pub fn apply(&mut self, event: GridEvent) {
    match event {
      GridEvent::Layout {
        columns,
        width_method,
        actions,
      } => {
        self.primary_key = columns
          .iter()
          .find(|c| c.primary_key)
          .map(|c| c.key.clone());
        self.columns = columns;
        self.width_method = width_method;
        self.actions = actions;
      }
      GridEvent::Page {
        index,
        rows,
        fetched_at,
      } => {
        if self.page_index != Some(index) {
          self.selected = 0;
        }
        self.page_index = Some(index);
        self.fetched_at = Some(fetched_at);
        self.rows = rows
          .into_iter()
          .map(|record| GridRow {
            record,
            styles: String::new(),
          })
          .collect();
      }
      GridEvent::RowInserted { record, at, styles } => {
        let row = GridRow { record, styles };
        match at {
          InsertAt::Top => self.rows.insert(0, row),
          InsertAt::Bottom => self.rows.push(row),
        }
      }
      GridEvent::RowReplaced {
        key,
        record,
        styles,
      } => {
        if let Some(position) = self.position_of(&key) {
          self.rows[position] = GridRow { record, styles };
        }
      }
      GridEvent::RowRemoved { key } => {
        if let Some(position) = self.position_of(&key) {
          self.rows.remove(position);
        }
      }
      GridEvent::Pagination(controls) => self.pagination = Some(controls),
      GridEvent::Loading(message) => self.loading = message,
    }
    self.clamp_selection();
  }

  fn position_of(&self, key: &Value) -> Option<usize> {
    let primary_key = self.primary_key.as_deref()?;
    self
      .rows
      .iter()
      .position(|row| row.record.get(primary_key) == Some(key))
  }

  fn clamp_selection(&mut self) {
    self.selected = self.selected.min(self.rows.len().saturating_sub(1));
  }

  pub fn is_ready(&self) -> bool {
    !self.columns.is_empty()
  }

  pub fn pagination(&self) -> Option<&PaginationControls> {
    self.pagination.as_ref()
  }

  pub fn loading(&self) -> Option<&str> {
    self.loading.as_deref()
  }

  pub fn move_selection(&mut self, delta: i32) {
    let len = self.rows.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  /// Primary-key value of the selected row
  pub fn selected_key(&self) -> Option<Value> {
    let primary_key = self.primary_key.as_deref()?;
    self.rows.get(self.selected)?.record.get(primary_key).cloned()
  }

  fn visible_columns(&self) -> Vec<&Column> {
    self.columns.iter().filter(|c| !c.hidden).collect()
  }

  fn cell(&self, column: &Column, record: &Record) -> String {
    if column.is_actions() {
      return self
        .actions
        .iter()
        .map(|kind| format!("[{}]", kind))
        .collect::<Vec<_>>()
        .join(" ");
    }
    truncate(&cell_text(record.get(&column.key)), MAX_CELL_CHARS)
  }

  fn title(&self, name: &str) -> String {
    match (&self.loading, self.page_index, self.fetched_at) {
      (Some(message), _, _) => format!(" {} ({}) ", name, message),
      (None, Some(index), Some(fetched_at)) => format!(
        " {} [page {}, fetched {}] ",
        name,
        index + 1,
        fetched_at.with_timezone(&Local).format("%H:%M:%S")
      ),
      (None, Some(index), None) => format!(" {} [page {}] ", name, index + 1),
      (None, None, _) => format!(" {} ", name),
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
      .title(self.title(title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.rows.is_empty() {
      let content = if self.is_ready() {
        "No rows on this page."
      } else {
        "Loading..."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let columns = self.visible_columns();
    let visible = columns.len();
    let widths: Vec<Constraint> = columns
      .iter()
      .map(|c| width_constraint(c.effective_width(self.width_method, visible).as_deref()))
      .collect();

    let header = Row::new(columns.iter().map(|c| c.header.clone()))
      .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = self
      .rows
      .iter()
      .map(|row| {
        let style = if row.styles.is_empty() {
          Style::default()
        } else {
          Style::default().fg(Color::Green)
        };
        Row::new(columns.iter().map(|c| self.cell(c, &row.record))).style(style)
      })
      .collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    let mut selection = RowSelection::default();
    selection.select(Some(self.selected));

    frame.render_stateful_widget(table, area, &mut selection);
  }
}
