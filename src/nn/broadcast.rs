//! Checkpoint fan-out from the learner to every worker.

use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Anything the learner can announce a new checkpoint to.
pub trait CheckpointSink {
    /// Announce that `path` holds the newest weights.
    fn broadcast(&mut self, path: &Path);
}

impl<F: FnMut(&Path)> CheckpointSink for F {
    fn broadcast(&mut self, path: &Path) {
        self(path)
    }
}

/// Delivers checkpoint paths to every registered worker.
///
/// Each endpoint is an unbounded channel, so broadcasting never blocks on
/// a slow worker. Endpoints whose receiver has been dropped are pruned.
#[derive(Debug, Default)]
pub struct Broadcaster {
    endpoints: Vec<(String, Sender<PathBuf>)>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker and return the receiving end of its endpoint.
    pub fn register(&mut self, name: impl Into<String>) -> Receiver<PathBuf> {
        let (tx, rx) = unbounded();
        self.endpoints.push((name.into(), tx));
        rx
    }

    /// Number of live endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl CheckpointSink for Broadcaster {
    fn broadcast(&mut self, path: &Path) {
        self.endpoints.retain(|(name, tx)| {
            if tx.send(path.to_path_buf()).is_ok() {
                true
            } else {
                log::warn!("Dropping checkpoint endpoint {}: receiver hung up", name);
                false
            }
        });
        log::info!("Broadcast {:?} to {} workers", path, self.endpoints.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_all() {
        let mut broadcaster = Broadcaster::new();
        let a = broadcaster.register("actor-0");
        let b = broadcaster.register("evaluator-0");

        broadcaster.broadcast(Path::new("/tmp/checkpoint-0.bin"));

        assert_eq!(a.try_recv().unwrap(), PathBuf::from("/tmp/checkpoint-0.bin"));
        assert_eq!(b.try_recv().unwrap(), PathBuf::from("/tmp/checkpoint-0.bin"));
    }

    #[test]
    fn test_hung_up_endpoint_pruned() {
        let mut broadcaster = Broadcaster::new();
        let a = broadcaster.register("actor-0");
        drop(broadcaster.register("actor-1"));
        assert_eq!(broadcaster.len(), 2);

        broadcaster.broadcast(Path::new("x"));
        assert_eq!(broadcaster.len(), 1);
        assert!(a.try_recv().is_ok());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: &Path| seen.push(p.to_path_buf());
            sink.broadcast(Path::new("a"));
            sink.broadcast(Path::new("b"));
        }
        assert_eq!(seen, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
