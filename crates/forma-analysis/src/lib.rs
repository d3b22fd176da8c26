//! FORMA Analysis - The synchronous per-frame path
//!
//! Every captured frame runs once through:
//! 1. Measure joint angles (geometry)
//! 2. Match the frame against catalog stages (identifier)
//! 3. Advance the stage/rep state machine (reps)
//! 4. Score the active stage's rules (scorer)
//! 5. Assemble the host-facing result (pipeline)
//!
//! Nothing here blocks or allocates beyond the result itself. Geometry and
//! scoring faults degrade to sentinels, never to errors.

#[cfg(test)]
mod fixtures;

pub mod config;
pub mod geometry;
pub mod identifier;
pub mod pipeline;
pub mod reps;
pub mod result;
pub mod scorer;

pub use config::*;
pub use geometry::*;
pub use identifier::*;
pub use pipeline::*;
pub use reps::*;
pub use result::*;
pub use scorer::*;
