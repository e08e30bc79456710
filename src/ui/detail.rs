use crate::ui::renderfns::cell_text;
use gridpager::grid::derive_header;
use gridpager::Record;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// One line per field, labelled with its derived header
pub fn detail_lines(record: &Record) -> Vec<Line<'static>> {
  let label_width = record
    .keys()
    .map(|k| derive_header(k).chars().count())
    .max()
    .unwrap_or(0);

  record
    .iter()
    .map(|(key, value)| {
      Line::from(vec![
        Span::styled(
          format!("{:<width$}  ", derive_header(key), width = label_width),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(cell_text(Some(value))),
      ])
    })
    .collect()
}

/// Centered popup with every field of `record`, hidden columns included
pub fn draw_record_detail(frame: &mut Frame, area: Rect, record: &Record) {
  let width = (area.width * 70 / 100).max(30).min(area.width);
  let height = (record.len() as u16 + 2).min(area.height);
  let popup = Rect::new(
    area.x + area.width.saturating_sub(width) / 2,
    area.y + area.height.saturating_sub(height) / 2,
    width,
    height,
  );

  frame.render_widget(Clear, popup);

  let block = Block::default()
    .title(" Record (Esc to close) ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  let paragraph = Paragraph::new(detail_lines(record))
    .block(block)
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, popup);
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_detail_lines_align_labels() {
    let record = json!({"id": 3, "ownerId": 1, "status": null})
      .as_object()
      .cloned()
      .unwrap();
    let lines: Vec<String> = detail_lines(&record)
      .iter()
      .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
      .collect();
    assert_eq!(lines, vec!["Id        3", "Owner Id  1", "Status    "]);
  }
}
