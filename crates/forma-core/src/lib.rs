//! FORMA Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every FORMA crate:
//! - Joint identifiers (the 33 MediaPipe pose landmarks)
//! - Landmarks and per-frame landmark snapshots
//! - Frame time (monotonic capture clock)
//! - The workspace error type

pub mod error;
pub mod joint;
pub mod landmark;
pub mod time;

pub use error::*;
pub use joint::*;
pub use landmark::*;
pub use time::*;
