//! Cell- and face-centered fields and the discrete operators acting on them.

pub use self::field::{FieldSnapshot, FiniteVolumeField, ScalarField, VectorField};
pub use self::registry::FieldRegistry;

pub mod gradient;

mod field;
mod registry;
