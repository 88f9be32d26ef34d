use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::engine::TypingTest;

/// What the host loop reacts to
#[derive(Clone, Debug)]
pub enum EngineEvent {
    Key(KeyEvent),
    /// No key arrived within the tick interval
    Tick,
    /// The key source has gone away; the host should stop
    Closed,
}

/// Where key presses come from
pub trait KeySource: Send + 'static {
    /// Wait up to `timeout` for the next key press
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError>;
}

/// Key presses read from the terminal on a background thread.
///
/// Only presses and repeats are forwarded. Releases, resizes, focus and
/// mouse events never reach the session.
pub struct TerminalKeys {
    rx: Receiver<KeyEvent>,
}

impl TerminalKeys {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "terminal key reader stopped");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Keys fed through a channel, for sessions without a terminal
pub struct ChannelKeys {
    rx: Receiver<KeyEvent>,
}

impl ChannelKeys {
    pub fn new(rx: Receiver<KeyEvent>) -> Self {
        Self { rx }
    }
}

impl KeySource for ChannelKeys {
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Turns a key source into the host's event stream: a key when one arrives,
/// otherwise a tick every `tick_rate`.
pub struct Runner<S: KeySource> {
    keys: S,
    tick_rate: Duration,
}

impl<S: KeySource> Runner<S> {
    pub fn new(keys: S, tick_rate: Duration) -> Self {
        Self { keys, tick_rate }
    }

    /// Block up to one tick interval for the next event
    pub fn step(&self) -> EngineEvent {
        match self.keys.next_key(self.tick_rate) {
            Ok(key) => EngineEvent::Key(key),
            Err(RecvTimeoutError::Timeout) => EngineEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => EngineEvent::Closed,
        }
    }
}

/// What a key press asks of the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Type(char),
    Backspace,
    /// Fresh prompt, back to a ready session
    Restart,
    Finish,
    Quit,
}

pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char(c) => Some(Command::Type(c)),
        KeyCode::Backspace => Some(Command::Backspace),
        KeyCode::Tab => Some(Command::Restart),
        KeyCode::Enter => Some(Command::Finish),
        KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

/// Feed one event to the test. Returns false once the host should stop.
pub fn dispatch(test: &mut TypingTest, event: EngineEvent) -> bool {
    match event {
        EngineEvent::Tick => test.on_tick(),
        EngineEvent::Closed => return false,
        EngineEvent::Key(key) => match command_for(&key) {
            Some(Command::Type(c)) => test.type_char(c),
            Some(Command::Backspace) => test.backspace(),
            Some(Command::Restart) => {
                test.reset();
                test.start();
            }
            Some(Command::Finish) => test.finish(),
            Some(Command::Quit) => return false,
            None => {}
        },
    }
    true
}
