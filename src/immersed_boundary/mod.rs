//! Direct-forcing immersed boundaries.
//!
//! Every step the cells are classified against the current pose of the bodies, each IB cell
//! gets a constrained least-squares stencil, and the forcing restoring the no-slip condition is
//! solved afresh from the velocity predicted without it.

pub use self::classification::{body_containing, nearest_body, CellClassification, CellStatus};
pub use self::extension::{extend_pressure, ExtensionReport};
pub use self::forcing::DirectForcing;
pub use self::stencil::{
    least_squares_weights, Basis, InterpolationStencil, SupportPoint, MIN_QUADRATIC_SUPPORT,
};

use crate::config::ImmersedBoundaryParameters;
use crate::error::Result;
use crate::geometry::{HGrid, HGridEntry};
use crate::linalg::{LinearSolver, SolveReport};
use crate::math::{Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid};
use crate::object::ImmersedBodySet;

mod classification;
mod extension;
mod forcing;
mod stencil;

/// The per-step immersed-boundary state: classification and stencils.
pub struct ImmersedBoundary {
    lookup: HGrid<HGridEntry>,
    margin: Real,
    classification: CellClassification,
    stencils: Vec<InterpolationStencil>,
    params: ImmersedBoundaryParameters,
}

impl ImmersedBoundary {
    /// Prepares the immersed boundaries of `grid`. Every cell starts FLUID.
    pub fn new(grid: &FiniteVolumeGrid, params: ImmersedBoundaryParameters) -> Self {
        let margin = grid
            .cells()
            .iter()
            .flat_map(|c| {
                let faces = grid.faces();
                c.faces
                    .iter()
                    .flat_map(move |f| faces[*f].nodes.iter())
                    .map(move |n| (*n - c.centroid).norm())
            })
            .fold(0.0, Real::max);
        let width = if margin > 0.0 { margin } else { 1.0 };

        Self {
            lookup: HGrid::from_grid(grid, width),
            margin: width,
            classification: CellClassification::all_fluid(grid),
            stencils: Vec::new(),
            params,
        }
    }

    /// The current classification.
    pub fn classification(&self) -> &CellClassification {
        &self.classification
    }

    /// The stencils of the local IB cells, built by the last call to `update`.
    pub fn stencils(&self) -> &[InterpolationStencil] {
        &self.stencils
    }

    /// The spatial lookup of the cells and boundary faces.
    pub fn lookup(&self) -> &HGrid<HGridEntry> {
        &self.lookup
    }

    /// Reclassifies the cells and rebuilds the stencils of every local IB cell.
    pub fn update(
        &mut self,
        grid: &FiniteVolumeGrid,
        bodies: &mut ImmersedBodySet,
        comm: &dyn Communicator,
    ) -> Result<()> {
        self.reclassify(grid, bodies, comm);
        self.build_stencils(grid, bodies)
    }

    /// Classifies the cells against the current pose of `bodies`.
    pub fn reclassify(
        &mut self,
        grid: &FiniteVolumeGrid,
        bodies: &mut ImmersedBodySet,
        comm: &dyn Communicator,
    ) {
        self.classification =
            CellClassification::classify(grid, &self.lookup, self.margin, bodies, comm);

        log::debug!(
            "immersed boundary: {} IB cells, {} SOLID cells",
            self.classification.ib_cells().len(),
            self.classification.solid_cells().len()
        );
    }

    /// Builds the stencil of every local IB cell of the current classification.
    pub fn build_stencils(&mut self, grid: &FiniteVolumeGrid, bodies: &ImmersedBodySet) -> Result<()> {
        let epsilon = self.params.pseudo_inverse_epsilon;
        let classification = &self.classification;

        self.stencils = classification
            .ib_cells()
            .iter()
            .filter(|c| grid.is_local(**c))
            .map(|c| InterpolationStencil::build(*c, grid, classification, bodies, epsilon))
            .collect::<Result<_>>()?;

        Ok(())
    }

    /// Recomputes the forcing `fib` from the velocity `u` predicted with the forcing of the
    /// previous step.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_forcing(
        &self,
        grid: &FiniteVolumeGrid,
        bodies: &ImmersedBodySet,
        rho: &[Real],
        u: &[Vector<Real>],
        dt: Real,
        fib: &mut [Vector<Real>],
        solver: &mut dyn LinearSolver,
    ) -> Result<SolveReport> {
        let unforced = DirectForcing::unforced_velocity(rho, u, fib, dt);
        DirectForcing::solve_forcing(
            grid,
            &self.classification,
            &self.stencils,
            bodies,
            rho,
            &unforced,
            dt,
            fib,
            solver,
        )
    }

    /// Sets the velocity of every local SOLID cell to the rigid motion of its body.
    pub fn enforce_rigid_motion(
        &self,
        grid: &FiniteVolumeGrid,
        bodies: &ImmersedBodySet,
        u: &mut [Vector<Real>],
    ) {
        let cells = grid.cells();

        for c in self.classification.solid_cells() {
            if let Some(body) = body_containing(bodies, &cells[*c].centroid) {
                u[*c] = body.velocity_at(&cells[*c].centroid);
            }
        }
    }

    /// Extends the pressure into the SOLID cells bordering the flow.
    pub fn extend_pressure(
        &self,
        grid: &FiniteVolumeGrid,
        bodies: &ImmersedBodySet,
        rho: &[Real],
        p: &mut [Real],
    ) -> ExtensionReport {
        extend_pressure(
            grid,
            &self.classification,
            bodies,
            rho,
            p,
            self.params.pseudo_inverse_epsilon,
        )
    }
}

#[cfg(test)]
mod test {
    use super::ImmersedBoundary;
    use crate::config::ImmersedBoundaryParameters;
    use crate::geometry::{Circle, Rectangle, Shape};
    use crate::mesh::CartesianGridBuilder;
    use crate::object::{ImmersedBody, ImmersedBodySet};
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    #[test]
    fn update_builds_one_stencil_per_ib_cell() {
        let grid = CartesianGridBuilder::new(30, 30, 1.0, 1.0).build();
        let mut ib = ImmersedBoundary::new(&grid, ImmersedBoundaryParameters::default());
        let mut bodies = ImmersedBodySet::new();
        let circle = Shape::Circle(Circle::new(Point2::new(0.3, 0.5), 0.1));
        let rect = Shape::Rectangle(Rectangle::new(Point2::new(0.7, 0.5), Vector2::new(0.1, 0.15)));
        let _ = bodies.insert(ImmersedBody::new(circle, 1.0));
        let _ = bodies.insert(ImmersedBody::new(rect, 1.0));

        ib.update(&grid, &mut bodies, &()).unwrap();
        assert_eq!(ib.stencils().len(), ib.classification().ib_cells().len());
        assert!(bodies.values().all(|b| !b.ib_cells().is_empty()));

        let first = ib.stencils().to_vec();
        ib.update(&grid, &mut bodies, &()).unwrap();
        assert_eq!(first, ib.stencils());
    }

    #[test]
    fn solid_cells_follow_the_rigid_motion() {
        let grid = CartesianGridBuilder::new(20, 20, 1.0, 1.0).build();
        let mut ib = ImmersedBoundary::new(&grid, ImmersedBoundaryParameters::default());
        let mut bodies = ImmersedBodySet::new();
        let circle = Shape::Circle(Circle::new(Point2::new(0.5, 0.5), 0.2));
        let mut body = ImmersedBody::new(circle, 1.0).with_velocity(Vector2::new(0.1, 0.0));
        body.angular_velocity = 2.0;
        let _ = bodies.insert(body);
        ib.update(&grid, &mut bodies, &()).unwrap();

        let stale = Vector2::new(-5.0, 7.0);
        let mut u = vec![stale; grid.ncells()];
        ib.enforce_rigid_motion(&grid, &bodies, &mut u);

        let solid = ib.classification().solid_cells();
        assert!(!solid.is_empty());

        for (c, cell) in grid.cells().iter().enumerate() {
            if solid.contains(&c) {
                let r = cell.centroid - Point2::new(0.5, 0.5);
                let expected = Vector2::new(0.1 - 2.0 * r.y, 2.0 * r.x);
                assert_relative_eq!(u[c], expected, epsilon = 1.0e-12);
            } else {
                assert_eq!(u[c], stale);
            }
        }
    }
}
