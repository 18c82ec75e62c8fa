//! Raw-mode keyboard reader feeding a [`ChannelControl`].
//!
//! Terminal I/O happens on its own thread; the streaming loop only ever sees
//! the receiving end of the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use parking_lot::Mutex;

use audio_playback_core::models::error::PlaybackError;
use audio_playback_core::traits::control_channel::{ChannelControl, ControlCommand};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Keyboard control thread.
///
/// Keys: space toggles pause, `p` pauses, `r` resumes, `q`/Esc/Ctrl-C stop.
pub struct KeyboardControl {
    running: Arc<AtomicBool>,
    reader_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl KeyboardControl {
    /// Enable raw mode and start reading keys.
    ///
    /// Returns the thread handle and the control channel to hand to the
    /// streaming loop.
    pub fn spawn() -> Result<(Self, ChannelControl), PlaybackError> {
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("keyboard-control".into())
            .spawn(move || {
                if let Err(e) = read_keys(&thread_running, &tx) {
                    log::error!("keyboard control: {}", e);
                }
                thread_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| PlaybackError::Io(format!("failed to spawn keyboard thread: {}", e)))?;

        let control = Self {
            running,
            reader_handle: Mutex::new(Some(handle)),
        };
        Ok((control, ChannelControl::new(rx)))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop reading keys, restore the terminal and join the thread.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyboardControl {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Restores cooked mode however the reader exits.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn read_keys(running: &AtomicBool, tx: &Sender<ControlCommand>) -> std::io::Result<()> {
    let _raw = RawModeGuard::enable()?;

    while running.load(Ordering::SeqCst) {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(command) = map_key(&key) else {
            continue;
        };
        log::debug!("keyboard: {:?}", command);
        if tx.send(command).is_err() || command == ControlCommand::Stop {
            break;
        }
    }
    Ok(())
}

/// Command bound to a key press, if any.
pub fn map_key(key: &KeyEvent) -> Option<ControlCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(ControlCommand::Stop),
        KeyCode::Char(' ') => Some(ControlCommand::TogglePause),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(ControlCommand::Pause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(ControlCommand::Resume),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(ControlCommand::Stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(map_key(&press(KeyCode::Char(' '))), Some(ControlCommand::TogglePause));
        assert_eq!(map_key(&press(KeyCode::Char('p'))), Some(ControlCommand::Pause));
        assert_eq!(map_key(&press(KeyCode::Char('R'))), Some(ControlCommand::Resume));
        assert_eq!(map_key(&press(KeyCode::Char('q'))), Some(ControlCommand::Stop));
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(ControlCommand::Stop));
        assert_eq!(map_key(&press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_stops() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&key), Some(ControlCommand::Stop));
        assert_eq!(map_key(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(&key), None);
    }
}
