/*!
**ibflow2d** is the time-integration core of a 2-dimensional finite-volume solver for incompressible
gas-liquid flows carrying rigid immersed bodies that do not conform to the mesh.
It uses [nalgebra](https://nalgebra.org) for vector/matrix math.

Each time step is a fractional-step (projection) pipeline:

1. body positions are advanced by a [`BodyKinematics`](crate::coupling::BodyKinematics) collaborator,
2. the phase indicator is advected with a bounded compressive scheme (CICSAM),
3. density, viscosity and the gravity source are derived from the phase indicator,
4. a momentum predictor is solved,
5. cells are classified against the immersed bodies and a direct-forcing term is built from
   constrained least-squares stencils,
6. contact forces are applied to the bodies,
7. the pressure projection is solved and the velocity corrected,
8. the pressure is extended into the solid cells.

## Features
- **Immersed boundaries:** direct forcing with 6-term quadratic least-squares stencils.
- **Interface capturing:** CICSAM with a Crank-Nicolson corrector and phase-consistent momentum fluxes.
- **Contacts:** soft-sphere, spring and lubrication models.
- **Distributed memory ready:** every halo exchange and reduction goes through a
  [`Communicator`](crate::mesh::Communicator), with a serial `()` implementation.
*/
#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_qualifications)]
#![warn(missing_docs)]
#![deny(unused_results)]
#![allow(type_alias_bounds)]
#![allow(missing_copy_implementations)]

extern crate nalgebra as na;
extern crate num_traits as num;

#[allow(unused_macros)]
macro_rules! par_iter {
    ($t: expr) => {{
        #[cfg(not(feature = "parallel"))]
        let it = $t.iter();

        #[cfg(feature = "parallel")]
        let it = $t.par_iter();
        it
    }};
}

macro_rules! par_iter_mut {
    ($t: expr) => {{
        #[cfg(not(feature = "parallel"))]
        let it = $t.iter_mut();

        #[cfg(feature = "parallel")]
        let it = $t.par_iter_mut();
        it
    }};
}

#[allow(unused_macros)]
macro_rules! par_reduce_sum {
    ($identity: expr, $t: expr) => {{
        #[cfg(not(feature = "parallel"))]
        let res = $t.fold($identity, |a, b| a + b);
        #[cfg(feature = "parallel")]
        let res = $t.reduce(|| $identity, |a, b| a + b);
        res
    }};
}

pub mod collision;
pub mod config;
pub mod counters;
pub mod coupling;
mod error;
pub mod field;
mod fractional_step;
pub mod geometry;
pub mod immersed_boundary;
pub mod linalg;
pub mod mesh;
pub mod multiphase;
pub mod object;
mod timestep_manager;

pub use crate::config::SolverConfig;
pub use crate::error::{Result, SolverError};
pub use crate::fractional_step::{FractionalStep, StageResiduals, StepDiagnostics};
pub use crate::timestep_manager::TimestepManager;

/// Aliases for mathematical types.
pub mod math {
    use na::{Matrix2, Point2, Vector2};

    /// The dimension of the ambient space.
    pub const DIM: usize = 2;

    /// The scalar type.
    ///
    /// Least-squares stencils are badly conditioned in single precision.
    pub type Real = f64;

    /// The point type.
    pub type Point<Real> = Point2<Real>;

    /// The vector type.
    pub type Vector<Real> = Vector2<Real>;

    /// Square matrix with dimension `Dim × Dim`.
    pub type Matrix<Real> = Matrix2<Real>;

    /// The perpendicular (counter-clockwise) of `v`.
    ///
    /// The 2D equivalent of the cross product `ω × v` for a unit `ω` along `z`.
    pub fn perp(v: &Vector<Real>) -> Vector<Real> {
        Vector::new(-v.y, v.x)
    }
}
