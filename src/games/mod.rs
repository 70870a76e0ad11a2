//! Reference game implementations.

pub mod mpg;
