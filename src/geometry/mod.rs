//! Body shapes and spatial lookups on the grid.

pub use self::hgrid::{HGrid, HGridEntry};
pub use self::shape::{BoundaryElement, Circle, Rectangle, Shape};

mod hgrid;
mod shape;
