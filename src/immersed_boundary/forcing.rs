use crate::error::Result;
use crate::immersed_boundary::classification::{body_containing, CellStatus};
use crate::immersed_boundary::{CellClassification, InterpolationStencil, SupportPoint};
use crate::linalg::{LinearSolver, SolveReport, VectorEquation};
use crate::math::{Real, Vector};
use crate::mesh::FiniteVolumeGrid;
use crate::object::ImmersedBodySet;

/// Direct forcing: the forcing of the IB cells makes the forced velocity satisfy the stencil
/// interpolation, and the forcing of the SOLID cells makes it match the rigid body velocity.
pub struct DirectForcing;

impl DirectForcing {
    /// Solves for the forcing density `fib` of the current step.
    ///
    /// `u` is the velocity predicted without any forcing. The forced velocity of a cell is
    /// `u + dt fib / ρ`, and the forcing is computed from scratch so that:
    ///
    /// * FLUID cells have no forcing,
    /// * SOLID cells move with the body containing them: `fib = ρ (u_body − u)/dt`,
    /// * each IB cell satisfies `u(cell) = Σ β_i u(support_i)` on the forced velocity, with the
    ///   boundary supports carrying the body velocity.
    ///
    /// Written for `fib` the IB rows read `fib_c − Σ β_i (ρ_c/ρ_i) fib_i = ρ_c/dt (Σ β_i u_i +
    /// Σ β_b u_b − u_c)`. They are solved for the velocity increment `δ = dt fib/ρ` instead, which
    /// keeps the coefficients of order one across a density jump. Ghost rows keep their current
    /// forcing.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_forcing(
        grid: &FiniteVolumeGrid,
        classification: &CellClassification,
        stencils: &[InterpolationStencil],
        bodies: &ImmersedBodySet,
        rho: &[Real],
        u: &[Vector<Real>],
        dt: Real,
        fib: &mut [Vector<Real>],
        solver: &mut dyn LinearSolver,
    ) -> Result<SolveReport> {
        let mut eqn = VectorEquation::new("ibForcing", grid.ncells(), Vector::zeros());

        for (c, cell) in grid.cells().iter().enumerate() {
            let fixed = if !cell.is_local {
                fib[c] * (dt / rho[c])
            } else {
                match classification.status(c) {
                    CellStatus::Solid => body_containing(bodies, &cell.centroid)
                        .map(|body| body.velocity_at(&cell.centroid) - u[c])
                        .unwrap_or_else(Vector::zeros),
                    _ => Vector::zeros(),
                }
            };
            eqn.fix(c, fixed);
        }

        for stencil in stencils {
            let c = stencil.cell;
            let mut coeffs = vec![(c, 1.0)];
            let mut target = -u[c];

            for (support, w) in stencil.supports.iter().zip(stencil.weights.iter()) {
                match support {
                    SupportPoint::Cell(nb) => {
                        coeffs.push((*nb, -*w));
                        target += u[*nb] * *w;
                    }
                    SupportPoint::Boundary { velocity, .. } => target += velocity * *w,
                }
            }

            eqn.set_row(c, &coeffs, target);
        }

        let mut increment: Vec<_> = (0..grid.ncells())
            .map(|c| fib[c] * (dt / rho[c]))
            .collect();
        let report = eqn.solve(solver, &mut increment)?;

        for (c, (f, du)) in fib.iter_mut().zip(increment).enumerate() {
            *f = du * (rho[c] / dt);
        }

        for c in classification.fluid_cells() {
            fib[*c] = Vector::zeros();
        }

        Ok(report)
    }

    /// The velocity predicted without the forcing `fib` from the forced velocity `u`.
    pub fn unforced_velocity(
        rho: &[Real],
        u: &[Vector<Real>],
        fib: &[Vector<Real>],
        dt: Real,
    ) -> Vec<Vector<Real>> {
        u.iter()
            .zip(fib)
            .zip(rho)
            .map(|((u, f), rho)| u - f * (dt / *rho))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::DirectForcing;
    use crate::config::LinearSolverParameters;
    use crate::geometry::{Circle, HGrid, Shape};
    use crate::immersed_boundary::{
        CellClassification, CellStatus, InterpolationStencil, SupportPoint,
    };
    use crate::linalg::BiCgStab;
    use crate::mesh::CartesianGridBuilder;
    use crate::object::{ImmersedBody, ImmersedBodySet};
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    fn setup(
        v: Vector2<f64>,
        center: Point2<f64>,
    ) -> (
        crate::mesh::FiniteVolumeGrid,
        ImmersedBodySet,
        CellClassification,
        Vec<InterpolationStencil>,
    ) {
        let grid = CartesianGridBuilder::new(20, 20, 1.0, 1.0).build();
        let lookup = HGrid::from_grid(&grid, 0.05);
        let mut bodies = ImmersedBodySet::new();
        let shape = Shape::Circle(Circle::new(center, 0.17));
        let _ = bodies.insert(ImmersedBody::new(shape, 1.0).with_velocity(v));

        let classification = CellClassification::classify(&grid, &lookup, 0.05, &mut bodies, &());
        let stencils: Vec<_> = classification
            .ib_cells()
            .iter()
            .map(|c| InterpolationStencil::build(*c, &grid, &classification, &bodies, 1.0e-12))
            .collect::<Result<_, _>>()
            .unwrap();

        (grid, bodies, classification, stencils)
    }

    #[test]
    fn uniform_flow_past_a_body_moving_with_it() {
        let v = Vector2::new(0.3, -0.1);
        let (grid, bodies, classification, stencils) = setup(v, Point2::new(0.5, 0.5));

        // A flow already moving with the body satisfies every constraint, whatever the
        // forcing of the previous step was.
        let u = vec![v; grid.ncells()];
        let rho = vec![2.0; grid.ncells()];
        let mut fib = vec![Vector2::new(1.0, 1.0); grid.ncells()];
        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = DirectForcing::solve_forcing(
            &grid,
            &classification,
            &stencils,
            &bodies,
            &rho,
            &u,
            0.1,
            &mut fib,
            &mut solver,
        )
        .unwrap();

        for f in &fib {
            assert_relative_eq!(*f, Vector2::zeros(), epsilon = 1.0e-8);
        }
    }

    #[test]
    fn forced_velocity_meets_the_constraints_across_a_density_jump() {
        let v = Vector2::new(0.0, -0.4);
        let (grid, bodies, classification, stencils) = setup(v, Point2::new(0.45, 0.5));
        let dt = 1.0e-2;

        let rho: Vec<_> = grid
            .cells()
            .iter()
            .map(|c| if c.centroid.y < 0.5 { 998.0 } else { 1.205 })
            .collect();
        let u: Vec<_> = grid
            .cells()
            .iter()
            .map(|c| Vector2::new(c.centroid.y, 0.1 * c.centroid.x))
            .collect();
        let mut fib = vec![Vector2::zeros(); grid.ncells()];
        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = DirectForcing::solve_forcing(
            &grid,
            &classification,
            &stencils,
            &bodies,
            &rho,
            &u,
            dt,
            &mut fib,
            &mut solver,
        )
        .unwrap();

        let forced: Vec<_> = (0..grid.ncells())
            .map(|c| u[c] + fib[c] * (dt / rho[c]))
            .collect();

        for (c, f) in fib.iter().enumerate() {
            match classification.status(c) {
                CellStatus::Fluid => assert_eq!(*f, Vector2::zeros()),
                CellStatus::Solid => assert_relative_eq!(forced[c], v, epsilon = 1.0e-8),
                CellStatus::Ib => {}
            }
        }

        for stencil in &stencils {
            let interpolated: Vector2<f64> = stencil.interpolate(|s| match s {
                SupportPoint::Cell(nb) => forced[*nb],
                SupportPoint::Boundary { velocity, .. } => *velocity,
            });
            assert_relative_eq!(forced[stencil.cell], interpolated, epsilon = 1.0e-6);
        }
    }

    #[test]
    fn unforced_velocity_removes_the_forcing() {
        let rho = [2.0, 4.0];
        let u = [Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        let fib = [Vector2::new(20.0, 0.0), Vector2::zeros()];

        let free = DirectForcing::unforced_velocity(&rho, &u, &fib, 0.1);
        assert_relative_eq!(free[0], Vector2::zeros());
        assert_relative_eq!(free[1], u[1]);
    }
}
