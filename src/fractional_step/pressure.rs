//! Pressure projection and velocity correction.

use crate::error::Result;
use crate::field::{gradient, FieldRegistry};
use crate::linalg::{LinearSolver, ScalarEquation, SolveReport};
use crate::math::{Real, Vector};
use crate::mesh::{BoundaryKind, Communicator, FiniteVolumeGrid};

/// Solves `∇ · (dt/ρ_f ∇p) = ∇ · u_f` for the pressure.
///
/// Outlets fix a zero pressure, the other patches have a zero normal gradient. If no patch of
/// any partition fixes the pressure, the cell with global id 0 is pinned to zero.
pub fn solve(
    grid: &FiniteVolumeGrid,
    fields: &mut FieldRegistry,
    dt: Real,
    solver: &mut dyn LinearSolver,
    comm: &dyn Communicator,
) -> Result<SolveReport> {
    let cells = grid.cells();
    let mut eqn = ScalarEquation::new("p", grid.ncells(), 0.0);

    for (f, face) in grid.faces().iter().enumerate() {
        let owner = face.owner;
        let a = dt / fields.rho.faces[f] * face.area() / grid.face_delta(f).norm();
        let flux = fields.u.faces[f].dot(&face.normal);

        match face.neighbor {
            Some(n) => {
                if cells[owner].is_local {
                    eqn.add(owner, owner, a);
                    eqn.add(owner, n, -a);
                    eqn.add_source(owner, -flux);
                }
                if cells[n].is_local {
                    eqn.add(n, n, a);
                    eqn.add(n, owner, -a);
                    eqn.add_source(n, flux);
                }
            }
            None if cells[owner].is_local => {
                eqn.add_source(owner, -flux);
                if grid.boundary_kind(f) == Some(BoundaryKind::Outlet) {
                    eqn.add(owner, owner, a);
                }
            }
            None => {}
        }
    }

    let pinned = !comm.any(grid.has_fixed_pressure());

    for (i, cell) in cells.iter().enumerate() {
        if !cell.is_local {
            eqn.fix(i, fields.p.cells[i]);
        } else if pinned && cell.global_id == 0 {
            eqn.fix(i, 0.0);
        }
    }

    let report = eqn.solve(solver, &mut fields.p.cells)?;
    fields.p.exchange(comm, grid);
    update_gradient(grid, fields, comm);

    Ok(report)
}

/// Refreshes the boundary pressures and the pressure gradient at faces and cells.
///
/// Face gradients are taken along the centroid line. Cell gradients use the density-weighted
/// reconstruction so that they match the face gradients divided by the density.
pub fn update_gradient(grid: &FiniteVolumeGrid, fields: &mut FieldRegistry, comm: &dyn Communicator) {
    let FieldRegistry { p, grad_p, rho, .. } = fields;

    for (f, face) in grid.faces().iter().enumerate() {
        p.faces[f] = match grid.boundary_kind(f) {
            Some(BoundaryKind::Outlet) => 0.0,
            Some(_) => p.cells[face.owner],
            None => grid.interpolate(f, &p.cells, 0.0),
        };
    }

    gradient::face_gradients(grid, p, &mut grad_p.faces);
    gradient::reconstruct_weighted(grid, &grad_p.faces, &rho.cells, &rho.faces, &mut grad_p.cells);
    grad_p.exchange(comm, grid);
}

/// Applies `u −= dt/ρ ∇p` at cells and faces.
pub fn correct_velocity(
    grid: &FiniteVolumeGrid,
    fields: &mut FieldRegistry,
    dt: Real,
    comm: &dyn Communicator,
) {
    let FieldRegistry { u, grad_p, rho, .. } = fields;

    for i in grid.local_cells() {
        u.cells[i] -= grad_p.cells[i] * (dt / rho.cells[i]);
    }
    u.exchange(comm, grid);

    for (f, uf) in u.faces.iter_mut().enumerate() {
        *uf -= grad_p.faces[f] * (dt / rho.faces[f]);
    }
}

/// The largest net volumetric flux out of a local cell, over all partitions.
pub fn max_divergence_error(grid: &FiniteVolumeGrid, u_faces: &[Vector<Real>], comm: &dyn Communicator) -> Real {
    let faces = grid.faces();
    let local = grid
        .local_cells()
        .map(|i| {
            grid.cells()[i]
                .faces
                .iter()
                .map(|f| u_faces[*f].dot(&faces[*f].outward_normal(i)))
                .sum::<Real>()
                .abs()
        })
        .fold(0.0, Real::max);

    comm.max(local)
}

/// The largest outflow Courant number `dt/V Σ max(u_f · S_f, 0)` of a local cell, over all
/// partitions.
pub fn max_courant_number(
    grid: &FiniteVolumeGrid,
    u_faces: &[Vector<Real>],
    dt: Real,
    comm: &dyn Communicator,
) -> Real {
    let faces = grid.faces();
    let local = grid
        .local_cells()
        .map(|i| {
            let cell = &grid.cells()[i];
            let outflow: Real = cell
                .faces
                .iter()
                .map(|f| u_faces[*f].dot(&faces[*f].outward_normal(i)).max(0.0))
                .sum();
            outflow * dt / cell.volume
        })
        .fold(0.0, Real::max);

    comm.max(local)
}

#[cfg(test)]
mod test {
    use super::{correct_velocity, max_courant_number, max_divergence_error, solve};
    use crate::config::LinearSolverParameters;
    use crate::field::FieldRegistry;
    use crate::linalg::BiCgStab;
    use crate::mesh::{BoundaryKind, CartesianGridBuilder};
    use approx::assert_relative_eq;
    use na::Vector2;

    #[test]
    fn projection_removes_divergence() {
        let grid = CartesianGridBuilder::new(8, 8, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(1.0);

        // A source at the center of a closed box.
        for (f, face) in grid.faces().iter().enumerate() {
            if !face.is_boundary() {
                let r = face.centroid - na::Point2::new(0.5, 0.5);
                fields.u.faces[f] = r * 0.3;
            }
        }
        assert!(max_divergence_error(&grid, &fields.u.faces, &()) > 1.0e-3);

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = solve(&grid, &mut fields, 0.1, &mut solver, &()).unwrap();
        correct_velocity(&grid, &mut fields, 0.1, &());

        assert!(max_divergence_error(&grid, &fields.u.faces, &()) < 1.0e-8);
        // Wall faces keep no normal flow.
        for patch in grid.patches() {
            for f in &patch.faces {
                assert_relative_eq!(fields.u.faces[*f].dot(&grid.faces()[*f].normal), 0.0);
            }
        }
    }

    #[test]
    fn outlet_fixes_the_level() {
        let grid = CartesianGridBuilder::new(4, 4, 1.0, 1.0)
            .patch_kind("top", BoundaryKind::Outlet)
            .build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(1.0);
        fields.p.fill(7.0);

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let _ = solve(&grid, &mut fields, 0.1, &mut solver, &()).unwrap();

        for p in &fields.p.cells {
            assert_relative_eq!(*p, 0.0, epsilon = 1.0e-8);
        }
        assert_eq!(max_courant_number(&grid, &fields.u.faces, 0.1, &()), 0.0);
        assert_relative_eq!(fields.grad_p.cells[0], Vector2::zeros(), epsilon = 1.0e-8);
    }
}
