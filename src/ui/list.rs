use crate::sync::{Emphasis, ListView};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

pub fn draw_list(frame: &mut Frame, area: Rect, view: &ListView, state: &mut ListState) {
  super::ensure_valid_selection(state, view.rows.len());

  let block = Block::default()
    .title(" Todos ")
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if view.rows.is_empty() {
    let paragraph = Paragraph::new("No items. Press 'a' to add one.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = view
    .rows
    .iter()
    .map(|row| {
      let marker = if row.checked { "[x]" } else { "[ ]" };
      let line = Line::from(vec![
        Span::raw(format!(" {} ", marker)),
        Span::raw(row.text.clone()),
      ]);
      ListItem::new(line).style(emphasis_style(row.emphasis))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, state);
}

/// Blue flash for new items, red flash for deleting ones, green
/// strikethrough for done.
fn emphasis_style(emphasis: Emphasis) -> Style {
  match emphasis {
    Emphasis::Created => Style::default().bg(Color::Blue).fg(Color::White),
    Emphasis::Deleting => Style::default().bg(Color::Red).fg(Color::White),
    Emphasis::Checked => Style::default()
      .fg(Color::Green)
      .add_modifier(Modifier::CROSSED_OUT),
    Emphasis::Plain => Style::default(),
  }
}
