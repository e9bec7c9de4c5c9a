//! Immersed bodies.

pub use self::contiguous_arena::{ContiguousArena, ContiguousArenaIndex};
pub use self::immersed_body::{BodyForces, BodyHandle, ImmersedBody, ImmersedBodySet};

mod contiguous_arena;
mod immersed_body;
