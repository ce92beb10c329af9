//! Common types, traits, and error definitions for trajectory_engine
//!
//! This module provides the foundational building blocks used across
//! the generators, the planner and the evaluation code.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
