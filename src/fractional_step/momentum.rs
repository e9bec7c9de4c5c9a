//! Momentum predictor and well-balanced face velocities.

use crate::field::FieldRegistry;
use crate::immersed_boundary::{body_containing, CellClassification, CellStatus};
use crate::linalg::VectorEquation;
use crate::math::{Real, Vector};
use crate::mesh::{BoundaryKind, FiniteVolumeGrid};
use crate::object::ImmersedBodySet;

/// Assembles `V(ρ u − ρⁿ uⁿ)/dt + C(ρu, uⁿ) = ½[L(u) + L(uⁿ)] + V(f_st + s_g − ∇p + f_ib)`.
///
/// `C` is the explicit convection of `uⁿ` by the average of the two levels of momentum flux
/// produced by the phase advection, upwinded per level. `L` is the viscous Laplacian. Wall and
/// inlet faces impose the velocity stored on the face, outlets are zero gradient.
pub fn assemble(grid: &FiniteVolumeGrid, fields: &FieldRegistry, dt: Real) -> VectorEquation {
    let cells = grid.cells();
    let faces = grid.faces();
    let u_old = &fields.u.old(0).cells;
    let rho_old = &fields.rho.old(0).cells;
    let mut eqn = VectorEquation::new("u", grid.ncells(), Vector::zeros());

    for (i, cell) in cells.iter().enumerate() {
        if !cell.is_local {
            eqn.fix(i, fields.u.cells[i]);
            continue;
        }

        let v = cell.volume;
        eqn.add(i, i, fields.rho.cells[i] * v / dt);

        let sources = fields.fst.cells[i] + fields.sg.cells[i] - fields.grad_p.cells[i]
            + fields.fib.cells[i];
        eqn.add_source(i, u_old[i] * (rho_old[i] * v / dt) + sources * v);
    }

    for (f, face) in faces.iter().enumerate() {
        let owner = face.owner;
        let area = face.area();
        let mu = fields.mu.faces[f];

        // Convection.
        let transported = fields.momentum_flux.iter().fold(Vector::zeros(), |acc, flux| {
            let m = flux[f].dot(&face.normal);
            let upwind = match face.neighbor {
                Some(n) if m < 0.0 => u_old[n],
                None if m < 0.0 => fields.u.faces[f],
                _ => u_old[owner],
            };
            acc + upwind * (0.5 * m)
        });

        match face.neighbor {
            Some(n) => {
                let a = 0.5 * mu * area / grid.face_delta(f).norm();
                let explicit = (u_old[n] - u_old[owner]) * a;

                if cells[owner].is_local {
                    eqn.add(owner, owner, a);
                    eqn.add(owner, n, -a);
                    eqn.add_source(owner, explicit - transported);
                }
                if cells[n].is_local {
                    eqn.add(n, n, a);
                    eqn.add(n, owner, -a);
                    eqn.add_source(n, transported - explicit);
                }
            }
            None => {
                if !cells[owner].is_local {
                    continue;
                }
                eqn.add_source(owner, -transported);

                match grid.boundary_kind(f) {
                    Some(BoundaryKind::Outlet) => {}
                    _ => {
                        let a = 0.5 * mu * area / grid.face_delta(f).norm();
                        let ub = fields.u.faces[f];
                        eqn.add(owner, owner, a);
                        eqn.add_source(owner, ub * a + (ub - u_old[owner]) * a);
                    }
                }
            }
        }
    }

    eqn
}

/// Face velocities consistent with the cell velocities and the face forces.
///
/// Away from the bodies, the surface tension and gravity sources are removed from the
/// interpolated cell velocities and re-added at the face, so that a fluid at rest under balanced
/// forces stays at rest. Faces touching a SOLID cell interpolate the rigid velocity of the
/// SOLID side with the cell velocity of the other side.
pub fn face_velocities(
    grid: &FiniteVolumeGrid,
    classification: &CellClassification,
    bodies: &ImmersedBodySet,
    fields: &mut FieldRegistry,
    dt: Real,
) {
    let FieldRegistry {
        u, rho, fst, sg, ..
    } = fields;
    let cells = grid.cells();
    let faces = grid.faces();
    let body_force = |i: usize| (fst.cells[i] + sg.cells[i]) * (dt / rho.cells[i]);
    let u_cells = &u.cells;
    let cell_velocity = |i: usize| match classification.status(i) {
        CellStatus::Solid => body_containing(bodies, &cells[i].centroid)
            .map(|body| body.velocity_at(&cells[i].centroid))
            .unwrap_or(u_cells[i]),
        _ => u_cells[i],
    };

    for (f, face) in faces.iter().enumerate() {
        let owner = face.owner;
        let face_force = (fst.faces[f] + sg.faces[f]) * (dt / rho.faces[f]);

        u.faces[f] = match face.neighbor {
            Some(n) => {
                let touches_body = classification.status(owner) == CellStatus::Solid
                    || classification.status(n) == CellStatus::Solid;
                let g = grid.owner_weight(f);

                if touches_body {
                    cell_velocity(owner) * g + cell_velocity(n) * (1.0 - g)
                } else {
                    (u.cells[owner] - body_force(owner)) * g
                        + (u.cells[n] - body_force(n)) * (1.0 - g)
                        + face_force
                }
            }
            None => match grid.boundary_kind(f) {
                Some(BoundaryKind::Inlet { velocity, .. }) => velocity,
                Some(BoundaryKind::Outlet) => u.cells[owner] - body_force(owner) + face_force,
                _ => Vector::zeros(),
            },
        };
    }
}

#[cfg(test)]
mod test {
    use super::{assemble, face_velocities};
    use crate::config::LinearSolverParameters;
    use crate::field::FieldRegistry;
    use crate::immersed_boundary::CellClassification;
    use crate::linalg::BiCgStab;
    use crate::mesh::{BoundaryKind, CartesianGridBuilder};
    use crate::object::ImmersedBodySet;
    use approx::assert_relative_eq;
    use na::Vector2;

    #[test]
    fn uniform_pressure_gradient_accelerates_uniformly() {
        let grid = CartesianGridBuilder::new(4, 4, 1.0, 1.0)
            .patch_kind("left", BoundaryKind::Outlet)
            .patch_kind("right", BoundaryKind::Outlet)
            .patch_kind("bottom", BoundaryKind::Outlet)
            .patch_kind("top", BoundaryKind::Outlet)
            .build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(2.0);
        fields.rho.save_previous_time_step();
        fields.mu.fill(1.0e-3);
        fields.grad_p.fill(Vector2::new(-4.0, 0.0));
        fields.u.save_previous_time_step();

        let eqn = assemble(&grid, &fields, 0.1);
        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = eqn.solve(&mut solver, &mut fields.u.cells).unwrap();

        // ρ u / dt = -∇p
        for u in &fields.u.cells {
            assert_relative_eq!(*u, Vector2::new(0.2, 0.0), epsilon = 1.0e-8);
        }
    }

    #[test]
    fn hydrostatic_balance_gives_still_faces() {
        let grid = CartesianGridBuilder::new(3, 3, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(1.0);
        let force = Vector2::new(0.0, -3.0);
        fields.sg.fill(force);
        // Cells carry the velocity induced by the force over one step.
        fields.u.cells.iter_mut().for_each(|u| *u = force * 0.5);

        face_velocities(
            &grid,
            &CellClassification::all_fluid(&grid),
            &ImmersedBodySet::new(),
            &mut fields,
            0.5,
        );

        for (f, face) in grid.faces().iter().enumerate() {
            if face.is_boundary() {
                assert_eq!(fields.u.faces[f], Vector2::zeros());
            } else {
                assert_relative_eq!(fields.u.faces[f], force * 0.5, epsilon = 1.0e-12);
            }
        }
    }
}
