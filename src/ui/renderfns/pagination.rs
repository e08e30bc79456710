use gridpager::grid::PaginationControls;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

fn button(label: String, disabled: bool) -> Span<'static> {
  let style = if disabled {
    Style::default().fg(Color::DarkGray)
  } else {
    Style::default().fg(Color::Cyan)
  };
  Span::styled(label, style)
}

/// Pagination controls as one line: first, previous, current, next, last, then the info label
pub fn pagination_line(controls: &PaginationControls) -> Line<'static> {
  let back = controls.back_disabled();
  let forward = controls.forward_disabled();

  Line::from(vec![
    button(" |< ".to_string(), back),
    button(" < ".to_string(), back),
    Span::styled(
      format!(" {} ", controls.current_label()),
      Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
    ),
    button(" > ".to_string(), forward),
    button(" >| ".to_string(), forward),
    Span::raw("  "),
    Span::styled(controls.info(), Style::default().fg(Color::DarkGray)),
  ])
}

pub fn draw_pagination(frame: &mut Frame, area: Rect, controls: Option<&PaginationControls>) {
  let Some(controls) = controls else {
    return;
  };
  let paragraph = Paragraph::new(pagination_line(controls)).alignment(Alignment::Center);
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
  }

  #[test]
  fn test_pagination_line() {
    let line = pagination_line(&PaginationControls::new(1, 10, 95));
    assert_eq!(text(&line), " |<  <  2  >  >|   Page 2 of 10 (95 items)");
  }

  #[test]
  fn test_first_page_dims_back_buttons() {
    let line = pagination_line(&PaginationControls::new(0, 3, 25));
    assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
    assert_eq!(line.spans[1].style.fg, Some(Color::DarkGray));
    assert_eq!(line.spans[3].style.fg, Some(Color::Cyan));
  }
}
