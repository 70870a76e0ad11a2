//! Worker side of the checkpoint broadcast.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, TryRecvError};

/// Receives checkpoint paths from the learner.
///
/// Several paths may queue up while a worker is busy; only the newest one
/// matters, so polling drains the channel and returns the last path.
#[derive(Debug)]
pub struct CheckpointFeed {
    rx: Receiver<PathBuf>,
    disconnected: bool,
}

impl CheckpointFeed {
    pub fn new(rx: Receiver<PathBuf>) -> Self {
        Self {
            rx,
            disconnected: false,
        }
    }

    /// Block until the first checkpoint arrives. `None` if the learner is gone.
    pub fn wait(&mut self) -> Option<PathBuf> {
        match self.rx.recv() {
            Ok(path) => Some(path),
            Err(_) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Newest pending checkpoint, without blocking.
    pub fn poll(&mut self) -> Option<PathBuf> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(path) => latest = Some(path),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        latest
    }

    /// The learner has dropped its end of the broadcast.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}
