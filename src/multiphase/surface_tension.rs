use crate::field::{gradient, ScalarField, VectorField};
use crate::immersed_boundary::CellClassification;
use crate::math::{Real, Vector};
use crate::mesh::FiniteVolumeGrid;

/// Trait implemented by surface tension force models.
pub trait SurfaceTensionModel {
    /// The surface tension coefficient.
    fn sigma(&self) -> Real;
    /// The static contact angle with the walls, in radians.
    fn contact_angle(&self) -> Real;
    /// Recomputes the surface tension force density at cells and faces.
    ///
    /// The force must vanish in `Solid` cells.
    fn compute(
        &self,
        grid: &FiniteVolumeGrid,
        gamma: &ScalarField,
        grad_gamma: &VectorField,
        rho: &ScalarField,
        classification: &CellClassification,
        fst: &mut VectorField,
    );
}

/// No surface tension.
impl SurfaceTensionModel for () {
    fn sigma(&self) -> Real {
        0.0
    }

    fn contact_angle(&self) -> Real {
        std::f64::consts::FRAC_PI_2
    }

    fn compute(
        &self,
        _: &FiniteVolumeGrid,
        _: &ScalarField,
        _: &VectorField,
        _: &ScalarField,
        _: &CellClassification,
        fst: &mut VectorField,
    ) {
        fst.fill(Vector::zeros())
    }
}

/// Continuum surface force model: `f = σ κ ∇γ` with `κ = −∇ · n̂`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContinuumSurfaceForce {
    /// Surface tension coefficient.
    pub sigma: Real,
    /// Static contact angle, in radians.
    pub contact_angle: Real,
}

impl ContinuumSurfaceForce {
    /// A model with the tension coefficient `sigma` and a contact angle of 90 degrees.
    pub fn new(sigma: Real) -> Self {
        Self {
            sigma,
            contact_angle: std::f64::consts::FRAC_PI_2,
        }
    }

    /// Sets the static contact angle, in radians.
    pub fn with_contact_angle(mut self, contact_angle: Real) -> Self {
        self.contact_angle = contact_angle;
        self
    }

    fn curvature(&self, grid: &FiniteVolumeGrid, grad_gamma: &VectorField) -> Vec<Real> {
        let faces = grid.faces();

        let unit = |g: Vector<Real>| {
            let n = g.norm();
            if n > 1.0e-12 {
                g / n
            } else {
                Vector::zeros()
            }
        };

        grid.cells()
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let div = cell.faces.iter().fold(0.0, |acc, f| {
                    let g = grid.interpolate(*f, &grad_gamma.cells, grad_gamma.faces[*f]);
                    acc + unit(g).dot(&faces[*f].outward_normal(i))
                });
                -div / cell.volume
            })
            .collect()
    }
}

impl SurfaceTensionModel for ContinuumSurfaceForce {
    fn sigma(&self) -> Real {
        self.sigma
    }

    fn contact_angle(&self) -> Real {
        self.contact_angle
    }

    fn compute(
        &self,
        grid: &FiniteVolumeGrid,
        gamma: &ScalarField,
        grad_gamma: &VectorField,
        rho: &ScalarField,
        classification: &CellClassification,
        fst: &mut VectorField,
    ) {
        let kappa = self.curvature(grid, grad_gamma);
        gradient::face_gradients(grid, gamma, &mut fst.faces);

        for (f, force) in fst.faces.iter_mut().enumerate() {
            let kappa_f = grid.interpolate(f, &kappa, kappa[grid.faces()[f].owner]);
            *force *= self.sigma * kappa_f;
        }

        gradient::reconstruct_weighted(grid, &fst.faces, &rho.cells, &rho.faces, &mut fst.cells);

        for i in classification.solid_cells() {
            fst.cells[*i] = Vector::zeros();
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ContinuumSurfaceForce, SurfaceTensionModel};
    use crate::field::{gradient, FieldRegistry};
    use crate::immersed_boundary::CellClassification;
    use crate::mesh::CartesianGridBuilder;
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    #[test]
    fn flat_interface_has_no_force() {
        let grid = CartesianGridBuilder::new(6, 6, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(1.0);

        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if c.centroid.y < 0.5 { 1.0 } else { 0.0 };
        }
        for (i, f) in grid.faces().iter().enumerate() {
            fields.gamma.faces[i] = if f.centroid.y < 0.5 { 1.0 } else { 0.0 };
        }
        gradient::green_gauss(&grid, &fields.gamma, &mut fields.grad_gamma.cells);

        let model = ContinuumSurfaceForce::new(0.07);
        let classification = CellClassification::all_fluid(&grid);
        model.compute(
            &grid,
            &fields.gamma,
            &fields.grad_gamma,
            &fields.rho,
            &classification,
            &mut fields.fst,
        );

        // Away from the side walls a flat interface has no curvature.
        for (i, c) in grid.cells().iter().enumerate() {
            if c.centroid.x > 0.2 && c.centroid.x < 0.8 {
                assert_relative_eq!(fields.fst.cells[i], Vector2::zeros(), epsilon = 1.0e-10);
            }
        }
    }

    #[test]
    fn droplet_is_pulled_inward() {
        let grid = CartesianGridBuilder::new(20, 20, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        fields.rho.fill(1.0);
        let center = Point2::new(0.5, 0.5);

        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if na::distance(&c.centroid, &center) < 0.25 { 1.0 } else { 0.0 };
        }
        gradient::green_gauss(&grid, &fields.gamma, &mut fields.grad_gamma.cells);

        let model = ContinuumSurfaceForce::new(1.0);
        model.compute(
            &grid,
            &fields.gamma,
            &fields.grad_gamma,
            &fields.rho,
            &CellClassification::all_fluid(&grid),
            &mut fields.fst,
        );

        let mut net_inward = 0.0;
        for (i, c) in grid.cells().iter().enumerate() {
            net_inward += fields.fst.cells[i].dot(&(center - c.centroid));
        }
        assert!(net_inward > 0.0);
        assert_eq!(().sigma(), 0.0);
    }
}
