pub mod bridge;
pub mod components;
mod detail;
mod renderfns;
pub mod table;

use crate::app::{App, Status};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Table
      Constraint::Length(1), // Pagination
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.name(), app.api_url());
  app.view().render(frame, chunks[1], app.name());
  renderfns::draw_pagination(frame, chunks[2], app.view().pagination());
  draw_status_bar(frame, chunks[3], app);

  if let Some(record) = app.detail() {
    detail::draw_record_detail(frame, chunks[1], record);
  }
  app.command_input().render_overlay(frame, chunks[1]);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.status() {
    Some(Status::Error(msg)) => (format!(" {}", msg), Style::default().fg(Color::Red)),
    Some(Status::Info(msg)) => (format!(" {}", msg), Style::default().fg(Color::Yellow)),
    None => (
      " :command  j/k:row  h/l:page  g/G:first/last  Enter:record  r:refresh  q:quit".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
