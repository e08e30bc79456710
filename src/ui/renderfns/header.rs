use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with grid name, API host and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, name: &str, api_url: &str) {
  let host = extract_host(api_url);

  let header = Line::from(vec![
    Span::styled(" gridpager ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", name), Style::default().fg(Color::Yellow).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::raw("  "),
    Span::styled("<:>", Style::default().fg(Color::Cyan)),
    Span::styled(" command", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<h/l>", Style::default().fg(Color::Cyan)),
    Span::styled(" page", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<r>", Style::default().fg(Color::Cyan)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Host (and port) of an API URL, or the URL itself when it has none
fn extract_host(api_url: &str) -> String {
  match url::Url::parse(api_url) {
    Ok(parsed) => match (parsed.host_str(), parsed.port()) {
      (Some(host), Some(port)) => format!("{}:{}", host, port),
      (Some(host), None) => host.to_string(),
      _ => api_url.to_string(),
    },
    Err(_) => api_url.to_string(),
  }
}
