use crossterm::event::KeyEvent;

/// Events fed into the console loop.
#[derive(Debug)]
pub enum Event {
    /// Sent at the tick rate; background results are applied here.
    Tick,
    Key(KeyEvent),
    /// The terminal was resized; the next draw picks up the new size.
    Resize,
}
