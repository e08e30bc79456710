use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::bridge::{ChannelIndicator, ChannelRenderer};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::table::GridView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use gridpager::transport::HttpTransport;
use gridpager::{Grid, GridHandle, Record};
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Message shown in the status bar until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  Info(String),
  Error(String),
}

/// Main application state
pub struct App {
  config: Config,

  /// Queue in front of the grid engine
  grid: GridHandle,

  /// Rows, columns and controls as last rendered by the engine
  view: GridView,

  command_input: CommandInput,

  /// Record opened with Enter
  detail: Option<Record>,

  status: Option<Status>,

  events: EventHandler,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  should_quit: bool,
}

impl App {
  /// Build the transport, initialize the grid on page 0 and start its worker
  pub async fn new(config: Config) -> Result<Self> {
    let events = EventHandler::new(Duration::from_millis(250));
    let event_tx = events.sender();

    let mut transport = HttpTransport::new()?;
    if let Some(token) = Config::get_api_token() {
      transport = transport.with_bearer_token(token);
    }

    let options = config
      .grid_options()
      .with_api_caller(Arc::new(transport))
      .with_loading_controls(Arc::new(ChannelIndicator::new(event_tx.clone())));

    let grid = Grid::init(
      &config.name,
      &config.api.url,
      options,
      ChannelRenderer::new(event_tx.clone()),
    )
    .await?;
    info!(
      grid = %config.name,
      total_pages = grid.total_pages(),
      "Grid ready"
    );

    Ok(Self {
      config,
      grid: GridHandle::spawn(grid),
      view: GridView::default(),
      command_input: CommandInput::new(),
      detail: None,
      status: None,
      events,
      event_tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = self.events.next().await {
        self.handle_event(event);
      } else {
        break;
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Grid(grid_event) => self.view.apply(grid_event),
      Event::RecordLoaded(Some(record)) => self.detail = Some(record),
      Event::RecordLoaded(None) => {
        self.status = Some(Status::Error("Record is not in the cache".to_string()));
      }
      Event::Error(msg) => {
        warn!(grid = %self.config.name, "{}", msg);
        self.status = Some(Status::Error(msg));
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.command_input.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.execute_command(&line);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled if self.command_input.is_active() => return,
      KeyResult::NotHandled => {}
    }

    self.status = None;

    if self.detail.is_some() {
      if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
        self.detail = None;
      }
      return;
    }

    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Rows
      KeyCode::Up | KeyCode::Char('k') => self.view.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.view.move_selection(1),
      KeyCode::Enter => self.open_selected(),

      // Pages
      KeyCode::Left | KeyCode::Char('h') => self.go_previous(),
      KeyCode::Right | KeyCode::Char('l') => self.go_next(),
      KeyCode::Char('g') | KeyCode::Home => self.navigate(0),
      KeyCode::Char('G') | KeyCode::End => self.go_last(),
      KeyCode::Char('r') => self.refresh(),

      _ => {}
    }
  }

  fn execute_command(&mut self, line: &str) {
    let action = match commands::parse_command(line) {
      Ok(action) => action,
      Err(e) => {
        self.status = Some(Status::Error(e.to_string()));
        return;
      }
    };

    match action {
      CommandAction::First => self.navigate(0),
      CommandAction::Last => self.go_last(),
      CommandAction::Next => self.go_next(),
      CommandAction::Prev => self.go_previous(),
      CommandAction::Page(index) => match self.view.pagination() {
        Some(controls) if index >= controls.total_pages => {
          self.status = Some(Status::Error(format!(
            "Page {} is past the last page ({})",
            index + 1,
            controls.total_pages
          )));
        }
        _ => self.navigate(index),
      },
      CommandAction::Refresh => self.refresh(),
      CommandAction::Set {
        filter_key,
        filter_value,
        update_key,
        update_value,
      } => self.update_column_where(filter_key, filter_value, update_key, update_value),
      CommandAction::Quit => self.should_quit = true,
    }
  }

  fn go_previous(&mut self) {
    match self.view.pagination().and_then(|p| p.previous_page()) {
      Some(index) => self.navigate(index),
      None => self.status = Some(Status::Info("Already on the first page".to_string())),
    }
  }

  fn go_next(&mut self) {
    match self.view.pagination().and_then(|p| p.next_page()) {
      Some(index) => self.navigate(index),
      None => self.status = Some(Status::Info("Already on the last page".to_string())),
    }
  }

  fn go_last(&mut self) {
    if let Some(index) = self.view.pagination().map(|p| p.last_page()) {
      self.navigate(index);
    }
  }

  fn navigate(&self, index: usize) {
    let grid = self.grid.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      if grid.page_to(index).await != Some(true) {
        let _ = tx.send(Event::Error(format!("Could not load page {}", index + 1)));
      }
    });
  }

  fn refresh(&mut self) {
    let grid = self.grid.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      if grid.refresh().await != Some(true) {
        let _ = tx.send(Event::Error("Refresh failed".to_string()));
      }
    });
    self.status = Some(Status::Info("Refreshing...".to_string()));
  }

  fn open_selected(&mut self) {
    let Some(key) = self.view.selected_key() else {
      self.status = Some(Status::Error(
        "Set grid.primary_key to open records".to_string(),
      ));
      return;
    };

    let grid = self.grid.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      if let Some(record) = grid.get_record(key).await {
        let _ = tx.send(Event::RecordLoaded(record));
      }
    });
  }

  fn update_column_where(
    &mut self,
    filter_key: String,
    filter_value: serde_json::Value,
    update_key: String,
    update_value: serde_json::Value,
  ) {
    let grid = self.grid.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let updated = grid
        .update_column_where(filter_key, filter_value, update_key, update_value, true)
        .await
        .unwrap_or_default();
      if updated == 0 {
        let _ = tx.send(Event::Error("No cached rows matched".to_string()));
      }
    });
  }

  // Accessors for UI rendering
  pub fn name(&self) -> &str {
    &self.config.name
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.url
  }

  pub fn view(&self) -> &GridView {
    &self.view
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn detail(&self) -> Option<&Record> {
    self.detail.as_ref()
  }

  pub fn status(&self) -> Option<&Status> {
    self.status.as_ref()
  }
}

