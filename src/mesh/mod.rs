//! The finite-volume grid and the partition collaborator.
//!
//! The grid is owned outside of the solver core: cells, faces and patches are addressed by
//! `usize` indices and links between them only store indices.

pub use self::cartesian::CartesianGridBuilder;
pub use self::communicator::{Communicator, HaloValue};
pub use self::grid::{BoundaryKind, Cell, CellLink, Face, FiniteVolumeGrid, Patch};

mod cartesian;
mod communicator;
mod grid;
