use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Terminal-side events.
#[derive(Debug)]
pub enum Event {
  /// Key press.
  Key(KeyEvent),
  /// Periodic tick, so in-flight indicators keep repainting.
  Tick,
}

/// Reads terminal input on a dedicated thread and hands it to the async
/// event loop. Crossterm's poll/read are blocking, so they stay off the
/// runtime entirely.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Start the reader thread with the given tick rate.
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || loop {
      let ready = event::poll(tick_rate).unwrap_or(false);
      let event = if ready {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
          // Resizes repaint on the next tick; everything else is ignored.
          Ok(_) => Event::Tick,
          Err(_) => break,
        }
      } else {
        Event::Tick
      };

      if tx.send(event).is_err() {
        break;
      }
    });

    Self { rx }
  }

  /// Receive the next event.
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
