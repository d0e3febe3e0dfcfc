use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::store::HttpStore;
use crate::sync::{present, ItemCache, ListView, OverlayState, RowView, SyncEngine, SyncEvent};
use crate::ui;
use crate::ui::components::{InputResult, TextInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;

/// What the input line at the bottom is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Collecting text for a new item.
  NewItem,
  /// Collecting replacement text for an existing item.
  EditItem { key: String },
}

/// Main application state.
pub struct App {
  config: Config,

  /// Orchestrates all store traffic.
  engine: SyncEngine<HttpStore>,

  /// Outcomes of the engine's spawned tasks.
  sync_rx: mpsc::UnboundedReceiver<SyncEvent>,

  /// Snapshot of the remote collection.
  cache: ItemCache,

  /// Transient visual phases on top of the snapshot.
  overlay: OverlayState,

  mode: Mode,
  input: TextInput,
  list_state: ListState,
  should_quit: bool,
}

enum Incoming {
  Term(Event),
  Sync(SyncEvent),
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let base = config.store_url()?;
    let (tx, sync_rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(HttpStore::new(base), tx);

    Ok(Self {
      config,
      engine,
      sync_rx,
      cache: ItemCache::new(),
      overlay: OverlayState::new(),
      mode: Mode::Normal,
      input: TextInput::new(),
      list_state: ListState::default(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Initial data load
    self.engine.reload();

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      let incoming = tokio::select! {
        event = events.next() => event.map(Incoming::Term),
        sync_event = self.sync_rx.recv() => sync_event.map(Incoming::Sync),
      };

      match incoming {
        Some(Incoming::Term(Event::Key(key))) => self.handle_key(key),
        Some(Incoming::Term(Event::Tick)) => {} // Redraw happens every loop
        Some(Incoming::Sync(event)) => {
          self
            .engine
            .apply(event, &mut self.cache, &mut self.overlay);
        }
        None => break,
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_key(key),
      Mode::NewItem | Mode::EditItem { .. } => self.handle_input_key(key),
    }
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

      // Navigation
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),

      KeyCode::Char('r') => self.engine.reload(),

      KeyCode::Char('a') | KeyCode::Char('n') => {
        self.mode = Mode::NewItem;
        self.input.clear();
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(row) = self.selected_row() {
          self.input = TextInput::with_value(&row.text);
          self.mode = Mode::EditItem { key: row.key };
        }
      }
      KeyCode::Char(' ') | KeyCode::Char('x') => {
        if let Some(row) = self.selected_row() {
          self.engine.toggle_item(&self.cache, &row.key);
        }
      }
      KeyCode::Char('d') => {
        if let Some(row) = self.selected_row() {
          self.engine.delete_item(&mut self.overlay, &row.key);
        }
      }

      _ => {}
    }
  }

  fn handle_input_key(&mut self, key: KeyEvent) {
    match self.input.handle_key(key) {
      InputResult::Submitted(text) => {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
          Mode::NewItem => self.engine.create_item(&text),
          Mode::EditItem { key } => self.engine.edit_item(&self.cache, &key, &text),
          Mode::Normal => {}
        }
      }
      // Cancelled input never reaches the engine.
      InputResult::Cancelled => self.mode = Mode::Normal,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  /// The row under the cursor, from the same derived view the list renders.
  fn selected_row(&self) -> Option<RowView> {
    let view = self.view();
    self
      .list_state
      .selected()
      .and_then(|index| view.rows.get(index).cloned())
  }

  // Accessors for UI rendering

  pub fn view(&self) -> ListView {
    present(&self.cache, &self.overlay)
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn input(&self) -> &TextInput {
    &self.input
  }

  pub fn is_loading(&self) -> bool {
    self.engine.is_loading()
  }

  pub fn error_message(&self) -> Option<String> {
    self.engine.last_error().map(|error| error.to_string())
  }

  pub fn title(&self) -> String {
    self.config.display_title()
  }

  pub fn list_state(&mut self) -> &mut ListState {
    &mut self.list_state
  }
}
