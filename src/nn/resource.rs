//! Learner-side model ownership and checkpoint files.
//!
//! The learner is the only writer of checkpoints. Files are written to a
//! temporary name and renamed into place, so a path that has been
//! broadcast always refers to a complete, loadable file.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::nn::traits::Model;

/// Which checkpoint slot to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckpointTag {
    /// Numbered checkpoint, kept.
    Step(u64),
    /// The single rolling slot, overwritten on each save.
    Latest,
}

impl CheckpointTag {
    /// Numeric form used in log records.
    pub const LATEST: i64 = -1;

    /// Tag for the checkpoint written at the end of `step`.
    pub fn for_step(step: u64, checkpoint_freq: u64) -> Self {
        if checkpoint_freq > 0 && step % checkpoint_freq == 0 {
            CheckpointTag::Step(step)
        } else {
            CheckpointTag::Latest
        }
    }

    /// Numeric form: the step number, or `-1` for `Latest`.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            CheckpointTag::Step(step) => step as i64,
            CheckpointTag::Latest => Self::LATEST,
        }
    }

    /// File name inside the checkpoint directory.
    #[must_use]
    pub fn file_name(self) -> String {
        match self {
            CheckpointTag::Step(step) => format!("checkpoint-{}.bin", step),
            CheckpointTag::Latest => "checkpoint-latest.bin".to_string(),
        }
    }
}

impl From<i64> for CheckpointTag {
    fn from(value: i64) -> Self {
        if value < 0 {
            CheckpointTag::Latest
        } else {
            CheckpointTag::Step(value as u64)
        }
    }
}

/// The learner's model plus its checkpoint directory.
pub struct ModelResource<M: Model> {
    model: M,
    dir: PathBuf,
}

impl<M: Model> ModelResource<M> {
    /// Take ownership of `model`, creating `dir` if needed.
    pub fn new(model: M, dir: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ModelError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { model, dir })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `tag` is stored. Deterministic: the same tag always maps to
    /// the same path.
    #[must_use]
    pub fn checkpoint_path(&self, tag: CheckpointTag) -> PathBuf {
        self.dir.join(tag.file_name())
    }

    /// Persist the current weights under `tag` and return the file path.
    pub fn save_checkpoint(&self, tag: CheckpointTag) -> Result<PathBuf, ModelError> {
        let bytes = self.model.save_weights()?;
        let path = self.checkpoint_path(tag);
        let staging = path.with_extension("bin.tmp");

        fs::write(&staging, &bytes).map_err(|source| ModelError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;

        log::debug!("Saved checkpoint {:?} ({} bytes)", path, bytes.len());
        Ok(path)
    }

    /// Restore weights from a checkpoint file.
    pub fn load(&mut self, path: &Path) -> Result<(), ModelError> {
        load_weights_from(&mut self.model, path)
    }

    /// Content identity of the current weights.
    pub fn hash(&self) -> Result<String, ModelError> {
        Ok(weights_hash(&self.model.save_weights()?))
    }
}

/// Read a checkpoint file into `model`.
pub fn load_weights_from<M: Model + ?Sized>(model: &mut M, path: &Path) -> Result<(), ModelError> {
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    model.load_weights(&bytes)
}

/// 64-bit hex digest of serialized weights.
#[must_use]
pub fn weights_hash(bytes: &[u8]) -> String {
    let mut hasher = rustc_hash::FxHasher::default();
    hasher.write(bytes);
    hasher.write_usize(bytes.len());
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SeededRng;
    use crate::nn::LinearModel;

    fn resource(dir: &Path, seed: u64) -> ModelResource<LinearModel> {
        let model = LinearModel::new(3, 2, &mut SeededRng::new(seed));
        ModelResource::new(model, dir).unwrap()
    }

    #[test]
    fn test_tag_for_step() {
        assert_eq!(CheckpointTag::for_step(0, 100), CheckpointTag::Step(0));
        assert_eq!(CheckpointTag::for_step(7, 100), CheckpointTag::Latest);
        assert_eq!(CheckpointTag::for_step(200, 100), CheckpointTag::Step(200));
        assert_eq!(CheckpointTag::for_step(3, 1), CheckpointTag::Step(3));
    }

    #[test]
    fn test_tag_numeric_form() {
        assert_eq!(CheckpointTag::from(-1), CheckpointTag::Latest);
        assert_eq!(CheckpointTag::from(4), CheckpointTag::Step(4));
        assert_eq!(CheckpointTag::Latest.as_i64(), -1);
        assert_eq!(CheckpointTag::Step(9).as_i64(), 9);
    }

    #[test]
    fn test_latest_path_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let res = resource(dir.path(), 0);

        let first = res.save_checkpoint(CheckpointTag::Latest).unwrap();
        let second = res.save_checkpoint(CheckpointTag::Latest).unwrap();
        assert_eq!(first, second);
        assert!(first.exists());

        let numbered = res.save_checkpoint(CheckpointTag::Step(0)).unwrap();
        assert_ne!(numbered, first);
        assert!(numbered.ends_with("checkpoint-0.bin"));
    }

    #[test]
    fn test_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let source = resource(dir.path(), 1);
        let mut target = resource(dir.path(), 2);
        assert_ne!(source.hash().unwrap(), target.hash().unwrap());

        let path = source.save_checkpoint(CheckpointTag::Step(5)).unwrap();
        target.load(&path).unwrap();
        assert_eq!(source.hash().unwrap(), target.hash().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut res = resource(dir.path(), 0);
        let missing = dir.path().join("nope.bin");
        assert!(matches!(res.load(&missing), Err(ModelError::Io { .. })));
    }

    #[test]
    fn test_hash_format() {
        let hash = weights_hash(b"abc");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, weights_hash(b"abc"));
        assert_ne!(hash, weights_hash(b"abd"));
    }
}
