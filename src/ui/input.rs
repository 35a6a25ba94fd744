/// Input drain.
///
/// Commands are edge-triggered — one keypress, one commandment — so
/// unlike a held-key action game this only needs the fresh presses
/// from each frame, not a held-key set.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, poll};

pub struct InputState {
    presses: Vec<KeyCode>,
    quit: bool,
}

impl InputState {
    pub fn new() -> InputState {
        InputState { presses: Vec::with_capacity(8), quit: false }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
                {
                    self.quit = true;
                    continue;
                }
                self.presses.push(key.code);
            }
        }
    }

    /// Keys freshly pressed this frame, in arrival order.
    pub fn presses(&self) -> &[KeyCode] {
        &self.presses
    }

    /// Ctrl-C seen at any point.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}
