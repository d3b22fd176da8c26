//! FORMA Test Harness - Synthetic workouts and end-to-end validation
//!
//! This crate provides:
//! - Side-on poses with exact joint angles
//! - Frame chaos (jitter, joint dropout, occlusion bursts, reordering)
//! - Recording collaborators for the feedback orchestrator
//! - Scripted squat and curl workouts run through a coach session

pub mod chaos;
pub mod collaborators;
pub mod pose;
pub mod workout;

pub use chaos::*;
pub use collaborators::*;
pub use pose::*;
pub use workout::*;
