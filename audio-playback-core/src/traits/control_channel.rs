use std::sync::mpsc::{Receiver, TryRecvError};

/// Commands delivered to a streaming loop from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Pause,
    Resume,
    /// Pause if running, resume if paused (space bar).
    TogglePause,
    Stop,
}

/// Source of asynchronous control commands.
///
/// `poll_command` must never block; the streaming loop calls it once per
/// iteration between device writes.
pub trait ControlChannel {
    fn poll_command(&mut self) -> Option<ControlCommand>;
}

/// Control channel that never issues a command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoControl;

impl ControlChannel for NoControl {
    fn poll_command(&mut self) -> Option<ControlCommand> {
        None
    }
}

/// Receiving end of a command channel fed by another thread.
///
/// Once every sender is gone the channel goes quiet; playback carries on
/// until the source runs out.
#[derive(Debug)]
pub struct ChannelControl {
    receiver: Receiver<ControlCommand>,
    disconnected: bool,
}

impl ChannelControl {
    pub fn new(receiver: Receiver<ControlCommand>) -> Self {
        Self {
            receiver,
            disconnected: false,
        }
    }
}

impl ControlChannel for ChannelControl {
    fn poll_command(&mut self) -> Option<ControlCommand> {
        if self.disconnected {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(cmd) => Some(cmd),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::debug!("control channel disconnected");
                self.disconnected = true;
                None
            }
        }
    }
}
