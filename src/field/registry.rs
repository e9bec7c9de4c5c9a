use crate::field::{ScalarField, VectorField};
use crate::math::{Real, Vector};
use crate::mesh::FiniteVolumeGrid;

/// Every field of the solver.
///
/// The registry is owned by the [`FractionalStep`](crate::FractionalStep) solver which lends it
/// to the other components one call at a time.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    /// Velocity.
    pub u: VectorField,
    /// Pressure.
    pub p: ScalarField,
    /// Pressure gradient, density-weighted at the cells.
    pub grad_p: VectorField,
    /// Phase indicator, `0` in phase 1 and `1` in phase 2.
    pub gamma: ScalarField,
    /// Phase indicator gradient.
    pub grad_gamma: VectorField,
    /// Density.
    pub rho: ScalarField,
    /// Dynamic viscosity.
    pub mu: ScalarField,
    /// Density gradient.
    pub grad_rho: VectorField,
    /// Well-balanced gravity source `-(g · x) ∇ρ`.
    pub sg: VectorField,
    /// Surface tension force density.
    pub fst: VectorField,
    /// Immersed-boundary forcing.
    pub fib: VectorField,
    /// Phase-consistent momentum flux `ρ_f u_f` at the new (`[0]`) and old (`[1]`) phase state,
    /// one value per face.
    pub momentum_flux: [Vec<Vector<Real>>; 2],
    /// Mass flux `ρ_f (u_f · S_f)` carried by the phase transport of the last advection, one
    /// value per face.
    pub phase_mass_flux: Vec<Real>,
}

impl FieldRegistry {
    /// Creates every field on `grid`: quiescent phase 1 with zero pressure.
    pub fn new(grid: &FiniteVolumeGrid) -> Self {
        let zero = Vector::zeros();

        Self {
            u: VectorField::new("u", grid, zero, 2),
            p: ScalarField::new("p", grid, 0.0, 1),
            grad_p: VectorField::new("gradP", grid, zero, 1),
            gamma: ScalarField::new("gamma", grid, 0.0, 1),
            grad_gamma: VectorField::new("gradGamma", grid, zero, 1),
            rho: ScalarField::new("rho", grid, 0.0, 1),
            mu: ScalarField::new("mu", grid, 0.0, 1),
            grad_rho: VectorField::new("gradRho", grid, zero, 1),
            sg: VectorField::new("sg", grid, zero, 1),
            fst: VectorField::new("fst", grid, zero, 1),
            fib: VectorField::new("fib", grid, zero, 1),
            momentum_flux: [vec![zero; grid.nfaces()], vec![zero; grid.nfaces()]],
            phase_mass_flux: vec![0.0; grid.nfaces()],
        }
    }

    /// All the scalar fields.
    pub fn scalars(&self) -> [&ScalarField; 4] {
        [&self.p, &self.gamma, &self.rho, &self.mu]
    }

    /// All the vector fields.
    pub fn vectors(&self) -> [&VectorField; 7] {
        [
            &self.u,
            &self.grad_p,
            &self.grad_gamma,
            &self.grad_rho,
            &self.sg,
            &self.fst,
            &self.fib,
        ]
    }

    /// The scalar field named `name`.
    pub fn scalar(&self, name: &str) -> Option<&ScalarField> {
        self.scalars().into_iter().find(|f| f.name() == name)
    }

    /// The vector field named `name`.
    pub fn vector(&self, name: &str) -> Option<&VectorField> {
        self.vectors().into_iter().find(|f| f.name() == name)
    }
}
