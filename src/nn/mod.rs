//! Model boundary for the training loop.
//!
//! ## Overview
//!
//! - **Traits**: `Model` (inference, update, weight bytes) and `Losses`
//! - **Models**: `LinearModel`, plus `UniformModel` as a parameter-free baseline
//! - **Keys**: `StateKey`, the exact cache key of a model input
//! - **Checkpoints**: `ModelResource`, `CheckpointTag`
//! - **Fan-out**: `Broadcaster` and the `CheckpointSink` trait
//!
//! ## Usage
//!
//! ```rust,ignore
//! use az_selfplay::nn::{CheckpointSink, CheckpointTag, ModelResource, LinearModel};
//!
//! let mut resource = ModelResource::new(LinearModel::for_game(&game, &config), &config.path)?;
//! let losses = resource.model_mut().update(&batch)?;
//! let path = resource.save_checkpoint(CheckpointTag::for_step(step, config.checkpoint_freq))?;
//! broadcaster.broadcast(&path);
//! ```

pub mod broadcast;
pub mod encoder;
pub mod linear;
pub mod resource;
pub mod traits;

pub use broadcast::{Broadcaster, CheckpointSink};
pub use encoder::StateKey;
pub use linear::LinearModel;
pub use resource::{load_weights_from, weights_hash, CheckpointTag, ModelResource};
pub use traits::{Inference, Losses, Model, UniformModel};
