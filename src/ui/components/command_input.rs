use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Events emitted by command input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Full command line, with the command name completed
  Submitted(String),
  Cancelled,
}

/// `:` prompt with autocomplete on the command name
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  buffer: String,
  cursor: usize,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  fn reset(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
    self.selected_suggestion = 0;
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.reset();
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.buffer)
  }

  /// Handle a key event.
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.active = false;
        self.reset();
        KeyResult::Event(CommandEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.active = false;
        let line = self.resolve_line();
        self.reset();
        KeyResult::Event(CommandEvent::Submitted(line))
      }
      KeyCode::Tab | KeyCode::Down => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + 1) % count;
        }
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            count - 1
          } else {
            self.selected_suggestion - 1
          };
        }
        KeyResult::Handled
      }
      KeyCode::Backspace => {
        if let Some((at, _)) = self.buffer[..self.cursor].char_indices().last() {
          self.buffer.remove(at);
          self.cursor = at;
          self.selected_suggestion = 0;
        }
        KeyResult::Handled
      }
      KeyCode::Left => {
        if let Some((at, _)) = self.buffer[..self.cursor].char_indices().last() {
          self.cursor = at;
        }
        KeyResult::Handled
      }
      KeyCode::Right => {
        if let Some(c) = self.buffer[self.cursor..].chars().next() {
          self.cursor += c.len_utf8();
        }
        KeyResult::Handled
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.selected_suggestion = 0;
        KeyResult::Handled
      }
      KeyCode::Char(c) => {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.selected_suggestion = 0;
        KeyResult::Handled
      }
      _ => KeyResult::NotHandled,
    }
  }

  /// Replace the typed command name with the selected suggestion, keeping arguments
  fn resolve_line(&self) -> String {
    let line = self.buffer.trim();
    let (name, args) = line.split_once(' ').unwrap_or((line, ""));
    let suggestions = self.suggestions();

    let name = match suggestions.get(self.selected_suggestion) {
      Some(cmd) => cmd.name,
      None => name,
    };
    if args.trim().is_empty() {
      name.to_string()
    } else {
      format!("{} {}", name, args.trim())
    }
  }

  /// Render the command overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();

    let width = (area.width * 60 / 100).clamp(30, 70);
    let suggestion_count = suggestions.len().min(8);
    let height = 3 + suggestion_count as u16;

    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let (before, after) = self.buffer.split_at(self.cursor);
    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if !suggestions.is_empty() && chunks[1].height > 0 {
      let items: Vec<ListItem> = suggestions
        .iter()
        .take(8)
        .map(|cmd| {
          let line = Line::from(vec![
            Span::styled(
              format!("{:<8}", cmd.name),
              Style::default().fg(Color::Cyan),
            ),
            Span::styled(
              format!("{:<22}", cmd.usage),
              Style::default().fg(Color::White),
            ),
            Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
          ]);
          ListItem::new(line)
        })
        .collect();

      let list =
        List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

      let mut state = ListState::default();
      state.select(Some(self.selected_suggestion));

      frame.render_stateful_widget(list, chunks[1], &mut state);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn typed(text: &str) -> CommandInput {
    let mut input = CommandInput::new();
    input.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
    input
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut input = CommandInput::new();
    assert_eq!(input.handle_key(key(KeyCode::Char('j'))), KeyResult::NotHandled);
    assert!(!input.is_active());
    assert_eq!(input.handle_key(key(KeyCode::Char(':'))), KeyResult::Handled);
    assert!(input.is_active());
  }

  #[test]
  fn test_submit_completes_name_and_keeps_args() {
    let mut input = typed("pa 3");
    assert_eq!(input.value(), "pa 3");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Submitted("page 3".to_string()))
    );
    assert!(!input.is_active());
    assert_eq!(input.value(), "");
  }

  #[test]
  fn test_tab_cycles_suggestions() {
    let mut input = typed("");
    input.handle_key(key(KeyCode::Tab));
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Submitted("last".to_string()))
    );
  }

  #[test]
  fn test_unknown_name_is_submitted_verbatim() {
    let mut input = typed("zzz 1");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Submitted("zzz 1".to_string()))
    );
  }

  #[test]
  fn test_editing() {
    let mut input = typed("nexz");
    input.handle_key(key(KeyCode::Backspace));
    input.handle_key(key(KeyCode::Char('t')));
    assert_eq!(input.value(), "next");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Left));
    input.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
    assert_eq!(input.value(), "xt");
  }

  #[test]
  fn test_escape_cancels() {
    let mut input = typed("refresh");
    assert_eq!(
      input.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(CommandEvent::Cancelled)
    );
    assert!(!input.is_active());
  }
}
