pub mod components;
mod list;

use crate::app::{App, Mode};
use crate::sync::ListView;
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Item list
      Constraint::Length(1), // Error banner
      Constraint::Length(1), // Status bar / input line
    ])
    .split(frame.area());

  let view = app.view();

  draw_header(frame, chunks[0], app, &view);
  list::draw_list(frame, chunks[1], &view, app.list_state());
  draw_error(frame, chunks[2], app);
  draw_status_bar(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App, view: &ListView) {
  let mut spans = vec![
    Span::styled(
      format!(" {} ", app.title()),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(
      format!("{} items, {} open", view.total, view.unchecked),
      Style::default().fg(Color::DarkGray),
    ),
  ];
  if app.is_loading() {
    spans.push(Span::styled(
      "  loading...",
      Style::default().fg(Color::Yellow),
    ));
  }

  frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// The banner shows the last error message, or nothing.
fn draw_error(frame: &mut Frame, area: Rect, app: &App) {
  let text = app.error_message().unwrap_or_default();
  let paragraph = Paragraph::new(format!(" {}", text)).style(Style::default().fg(Color::Red));
  frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Normal => {
      let hint = " a:new  e:edit  space:toggle  d:delete  r:reload  j/k:nav  q:quit";
      (hint.to_string(), Style::default().fg(Color::DarkGray))
    }
    Mode::NewItem => (
      format!(" new> {}", app.input().value()),
      Style::default().fg(Color::Yellow),
    ),
    Mode::EditItem { .. } => (
      format!(" edit> {}", app.input().value()),
      Style::default().fg(Color::Yellow),
    ),
  };

  if !matches!(app.mode(), Mode::Normal) {
    // Prefix is " new> " or " edit> "; place the cursor inside the input.
    let prefix = content
      .chars()
      .position(|c| c == '>')
      .map(|i| i + 2)
      .unwrap_or(0) as u16;
    frame.set_cursor_position((area.x + prefix + app.input().cursor() as u16, area.y));
  }

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

/// Keep the selection inside the list after the list changes size.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    Some(_) if len == 0 => state.select(None),
    Some(index) if index >= len => state.select(Some(len - 1)),
    None if len > 0 => state.select(Some(0)),
    _ => {}
  }
}
