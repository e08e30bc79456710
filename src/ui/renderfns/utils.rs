use ratatui::layout::Constraint;
use serde_json::Value;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Text shown in a cell: strings bare, null and missing fields empty, anything else as JSON
pub fn cell_text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

/// Layout constraint for a column width such as `"25.00%"`, `"120px"` or `"12"`.
/// Pixel widths are read as terminal cells. Unset or unreadable widths share the remaining space.
pub fn width_constraint(width: Option<&str>) -> Constraint {
  let Some(width) = width.map(str::trim) else {
    return Constraint::Fill(1);
  };

  if let Some(percent) = width.strip_suffix('%') {
    return match percent.trim().parse::<f64>() {
      Ok(p) if p > 0.0 => Constraint::Percentage(p.round().min(100.0) as u16),
      _ => Constraint::Fill(1),
    };
  }

  let cells = width.strip_suffix("px").unwrap_or(width).trim();
  match cells.parse::<u16>() {
    Ok(n) if n > 0 => Constraint::Length(n),
    _ => Constraint::Fill(1),
  }
}
