//! Two-phase modelling: interface capturing, mixture properties and surface tension.

pub use self::cicsam::{donor_acceptor, face_value, face_values, face_weight, Cicsam};
pub use self::flux_consistency::{check_mass_flux, FluxConsistency};
pub use self::properties::PropertyUpdater;
pub use self::surface_tension::{ContinuumSurfaceForce, SurfaceTensionModel};

use crate::error::Result;
use crate::field::{gradient, FieldRegistry};
use crate::linalg::{LinearSolver, ScalarEquation, SolveReport};
use crate::math::Real;
use crate::mesh::{BoundaryKind, Communicator, FiniteVolumeGrid};

mod cicsam;
mod flux_consistency;
mod properties;
mod surface_tension;

/// Advects the phase indicator with CICSAM and produces the matching momentum fluxes.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseAdvector {
    cicsam: Cicsam,
    properties: PropertyUpdater,
}

impl PhaseAdvector {
    /// An advector using `cicsam` for the face blending and `properties` for the face densities
    /// of the momentum fluxes.
    pub fn new(cicsam: Cicsam, properties: PropertyUpdater) -> Self {
        Self { cicsam, properties }
    }

    /// The face blending scheme.
    pub fn cicsam(&self) -> &Cicsam {
        &self.cicsam
    }

    /// Advances `gamma` by `dt` with the face velocities `u.faces`.
    ///
    /// An explicit predictor with the blending weights of the old state is followed by a
    /// Crank-Nicolson corrector whose implicit half uses the weights re-evaluated on the
    /// predicted state. The mass flux carried by the corrector is stored in `phase_mass_flux`.
    /// The result is clamped to `[0, 1]`, then the face values, the gradient and both levels of
    /// `momentum_flux` are refreshed.
    pub fn advect(
        &self,
        grid: &FiniteVolumeGrid,
        fields: &mut FieldRegistry,
        dt: Real,
        solver: &mut dyn LinearSolver,
        comm: &dyn Communicator,
    ) -> Result<SolveReport> {
        let FieldRegistry {
            u,
            gamma,
            grad_gamma,
            momentum_flux,
            phase_mass_flux,
            ..
        } = fields;
        let cells = grid.cells();
        let faces = grid.faces();
        let u_faces = &u.faces;
        let flux = |f: usize| u_faces[f].dot(&faces[f].normal);

        let beta_old =
            self.cicsam
                .face_weights(grid, u_faces, &gamma.cells, &grad_gamma.cells, dt);
        gamma.save_previous_time_step();

        // Explicit flux of the old state, reused by the corrector.
        let old_faces: Vec<Real> = (0..grid.nfaces())
            .map(|f| face_value(grid, f, flux(f), beta_old[f], &gamma.cells))
            .collect();
        let mut divergence = vec![0.0; grid.ncells()];
        for (f, face) in faces.iter().enumerate() {
            let transported = flux(f) * old_faces[f];
            divergence[face.owner] += transported;
            if let Some(n) = face.neighbor {
                divergence[n] -= transported;
            }
        }

        for i in grid.local_cells() {
            let predicted = gamma.cells[i] - dt / cells[i].volume * divergence[i];
            gamma.cells[i] = na::clamp(predicted, 0.0, 1.0);
        }
        gamma.exchange(comm, grid);
        let mut predicted_faces = vec![0.0; grid.nfaces()];
        face_values(grid, u_faces, &beta_old, gamma, &mut predicted_faces);
        gamma.faces = predicted_faces;
        gamma.save_previous_iteration();

        gradient::green_gauss(grid, gamma, &mut grad_gamma.cells);
        grad_gamma.exchange(comm, grid);
        let beta = self
            .cicsam
            .face_weights(grid, u_faces, &gamma.cells, &grad_gamma.cells, dt);

        let old = gamma.old(0);
        let mut eqn = ScalarEquation::new("gamma", grid.ncells(), 0.0);

        for i in 0..grid.ncells() {
            if grid.is_local(i) {
                let coeff = cells[i].volume / dt;
                eqn.add(i, i, coeff);
                eqn.add_source(i, coeff * old.cells[i] - 0.5 * divergence[i]);
            } else {
                eqn.fix(i, gamma.cells[i]);
            }
        }

        for (f, face) in faces.iter().enumerate() {
            let phi = 0.5 * flux(f);

            match donor_acceptor(grid, f, flux(f)) {
                (donor, Some(acceptor)) => {
                    let other = if donor == face.owner { acceptor } else { donor };
                    for (row, sign) in [(face.owner, 1.0), (other, -1.0)] {
                        if grid.is_local(row) {
                            eqn.add(row, donor, sign * phi * (1.0 - beta[f]));
                            eqn.add(row, acceptor, sign * phi * beta[f]);
                        }
                    }
                }
                (owner, None) => {
                    if !grid.is_local(owner) {
                        continue;
                    }
                    match grid.boundary_kind(f) {
                        Some(BoundaryKind::Inlet { gamma: inlet, .. }) if phi < 0.0 => {
                            eqn.add_source(owner, -phi * inlet)
                        }
                        _ => eqn.add(owner, owner, phi),
                    }
                }
            }
        }

        let report = eqn.solve(solver, &mut gamma.cells)?;

        // The corrector transports the average of the old and the implicit face values.
        for (f, m) in phase_mass_flux.iter_mut().enumerate() {
            let implicit = face_value(grid, f, flux(f), beta[f], &gamma.cells);
            let transported = 0.5 * (old_faces[f] + implicit);
            *m = self.properties.transported_density(transported) * flux(f);
        }

        gamma
            .cells
            .iter_mut()
            .for_each(|g| *g = na::clamp(*g, 0.0, 1.0));
        gamma.exchange(comm, grid);

        let mut new_faces = vec![0.0; grid.nfaces()];
        face_values(grid, u_faces, &beta, gamma, &mut new_faces);
        gamma.faces = new_faces;
        gradient::green_gauss(grid, gamma, &mut grad_gamma.cells);
        grad_gamma.exchange(comm, grid);

        let [new_flux, old_flux] = momentum_flux;
        for f in 0..grid.nfaces() {
            new_flux[f] = u_faces[f] * self.properties.density(gamma.faces[f]);
            old_flux[f] = u_faces[f] * self.properties.density(old_faces[f]);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::{Cicsam, PhaseAdvector, PropertyUpdater};
    use crate::config::{FluidProperties, LinearSolverParameters};
    use crate::field::FieldRegistry;
    use crate::linalg::BiCgStab;
    use crate::mesh::{BoundaryKind, CartesianGridBuilder};
    use approx::assert_relative_eq;
    use na::Vector2;

    fn advector() -> PhaseAdvector {
        PhaseAdvector::new(
            Cicsam::new(1.0),
            PropertyUpdater::new(&FluidProperties::default()),
        )
    }

    #[test]
    fn inflow_stays_bounded() {
        let velocity = Vector2::new(1.0, 0.0);
        let grid = CartesianGridBuilder::new(10, 2, 1.0, 0.2)
            .patch_kind("left", BoundaryKind::Inlet { velocity, gamma: 1.0 })
            .patch_kind("right", BoundaryKind::Outlet)
            .build();
        let mut fields = FieldRegistry::new(&grid);
        fields.u.fill(velocity);

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let advector = advector();

        for _ in 0..8 {
            let _ = advector
                .advect(&grid, &mut fields, 0.04, &mut solver, &())
                .unwrap();
            for g in fields.gamma.cells.iter().chain(&fields.gamma.faces) {
                assert!((0.0..=1.0).contains(g));
            }
        }

        // The front entered from the left and has not crossed the domain.
        let first = grid.patch("left").unwrap().faces[0];
        let inlet_cell = grid.faces()[first].owner;
        assert!(fields.gamma.cells[inlet_cell] > 0.5);
        let last = grid.patch("right").unwrap().faces[0];
        let outlet_cell = grid.faces()[last].owner;
        assert!(fields.gamma.cells[outlet_cell] < 0.1);
    }

    #[test]
    fn quiescent_state_is_unchanged() {
        let grid = CartesianGridBuilder::new(6, 6, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if c.centroid.y < 0.5 { 1.0 } else { 0.0 };
        }
        let initial = fields.gamma.cells.clone();

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = advector()
            .advect(&grid, &mut fields, 0.1, &mut solver, &())
            .unwrap();

        for (g, g0) in fields.gamma.cells.iter().zip(&initial) {
            assert_relative_eq!(*g, *g0, epsilon = 1.0e-10);
        }
        assert_eq!(fields.gamma.old(0).cells, initial);
    }

    #[test]
    fn momentum_flux_matches_face_density() {
        let grid = CartesianGridBuilder::new(5, 5, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        let properties = PropertyUpdater::new(&FluidProperties::default());

        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if c.centroid.x < 0.5 { 1.0 } else { 0.0 };
        }
        for (f, face) in grid.faces().iter().enumerate() {
            if !face.is_boundary() {
                fields.u.faces[f] = Vector2::new(0.2, 0.1);
            }
        }

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = advector()
            .advect(&grid, &mut fields, 0.05, &mut solver, &())
            .unwrap();

        for f in 0..grid.nfaces() {
            let expected = fields.u.faces[f] * properties.density(fields.gamma.faces[f]);
            assert_relative_eq!(fields.momentum_flux[0][f], expected);
        }
    }
}
