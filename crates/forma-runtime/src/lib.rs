//! FORMA Runtime - Wiring the engine for a host
//!
//! A coach session runs a 4-stage loop per tick:
//! 1. Ingest queued frames
//! 2. Analyze each frame (identify, count, score)
//! 3. Offer results to the feedback orchestrator
//! 4. Publish the snapshot and queue host events
//!
//! Hosts either drive `CoachSession::tick` themselves or spawn the session
//! as a task and talk to it through a `SessionHandle`.

pub mod config;
pub mod session;
pub mod telemetry;

pub use config::*;
pub use session::*;
pub use telemetry::*;
