//! Core algorithms – scroll engine, momentum, loop mapping, page transforms
//! and the render pipeline.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Time is
//! always passed in as an [`std::time::Instant`], so every piece can be
//! driven by a synthetic clock in tests.

pub mod content;
pub mod engine;
pub mod error;
pub mod input;
pub mod looping;
pub mod math;
pub mod momentum;
pub mod render;
pub mod schedule;
pub mod transform;
