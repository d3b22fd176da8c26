//! FORMA Feedback - Turning analysis results into coaching
//!
//! The orchestrator sits between the per-frame pipeline and two slow,
//! fallible collaborators: a text generator and a speech synthesizer.
//! Frames keep flowing while calls are pending; the orchestrator decides
//! which results are worth a call, bounds every call with a timeout, and
//! hands completions back to the frame loop over a channel.

pub mod collaborator;
pub mod config;
pub mod orchestrator;
pub mod timer;
pub mod wav;

pub use collaborator::*;
pub use config::*;
pub use orchestrator::*;
pub use timer::*;
pub use wav::*;
