//! Engine-facing half of the crate
//!
//! **Module Structure:**
//! - `backend.rs`: Collaborator traits and the engine notification stream
//! - `mirror.rs`: Ordered mirror of the engine's item list plus the cursor

pub mod backend;
pub mod mirror;

pub use backend::{EngineBackend, EngineNotification, ToEngineItem};
pub use mirror::EngineMirror;
