use crate::config::FluidProperties;
use crate::field::{gradient, FieldRegistry};
use crate::math::{Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Derives the density, viscosity and gravity source from the phase indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyUpdater {
    rho1: Real,
    rho2: Real,
    mu1: Real,
    mu2: Real,
    gravity: Vector<Real>,
}

impl PropertyUpdater {
    /// An updater for the given phase properties.
    pub fn new(props: &FluidProperties) -> Self {
        Self {
            rho1: props.rho1,
            rho2: props.rho2,
            mu1: props.mu1,
            mu2: props.mu2,
            gravity: props.gravity,
        }
    }

    /// `ρ1 + γ (ρ2 − ρ1)`, with `γ` clamped to `[0, 1]`.
    #[inline]
    pub fn density(&self, gamma: Real) -> Real {
        self.rho1 + na::clamp(gamma, 0.0, 1.0) * (self.rho2 - self.rho1)
    }

    /// `ρ1 + γ (ρ2 − ρ1)` without clamping, the density transported along with `γ`.
    #[inline]
    pub fn transported_density(&self, gamma: Real) -> Real {
        self.rho1 + gamma * (self.rho2 - self.rho1)
    }

    /// Dynamic viscosity from a harmonic blend of the kinematic viscosities.
    #[inline]
    pub fn viscosity(&self, gamma: Real) -> Real {
        let gamma = na::clamp(gamma, 0.0, 1.0);
        let nu1_inv = self.rho1 / self.mu1;
        let nu2_inv = self.rho2 / self.mu2;
        self.density(gamma) / (nu1_inv + gamma * (nu2_inv - nu1_inv))
    }

    /// Recomputes `rho`, `mu`, `grad_rho` and `sg` at cells and faces from `gamma`.
    ///
    /// The gravity source is `-(g · x) ∇ρ`, evaluated at the faces and brought back to the cells
    /// with the density-weighted reconstruction.
    pub fn update(&self, grid: &FiniteVolumeGrid, fields: &mut FieldRegistry, comm: &dyn Communicator) {
        let FieldRegistry {
            gamma,
            rho,
            mu,
            grad_rho,
            sg,
            ..
        } = fields;

        par_iter_mut!(rho.cells)
            .zip(par_iter!(gamma.cells))
            .for_each(|(r, g)| *r = self.density(*g));
        par_iter_mut!(rho.faces)
            .zip(par_iter!(gamma.faces))
            .for_each(|(r, g)| *r = self.density(*g));
        par_iter_mut!(mu.cells)
            .zip(par_iter!(gamma.cells))
            .for_each(|(m, g)| *m = self.viscosity(*g));
        par_iter_mut!(mu.faces)
            .zip(par_iter!(gamma.faces))
            .for_each(|(m, g)| *m = self.viscosity(*g));

        gradient::face_gradients(grid, rho, &mut grad_rho.faces);
        gradient::green_gauss(grid, rho, &mut grad_rho.cells);

        let faces = grid.faces();
        let gravity = self.gravity;
        par_iter_mut!(sg.faces)
            .enumerate()
            .for_each(|(f, s)| *s = grad_rho.faces[f] * -gravity.dot(&faces[f].centroid.coords));

        gradient::reconstruct_weighted(grid, &sg.faces, &rho.cells, &rho.faces, &mut sg.cells);

        rho.exchange(comm, grid);
        mu.exchange(comm, grid);
        sg.exchange(comm, grid);
    }
}

#[cfg(test)]
mod test {
    use super::PropertyUpdater;
    use crate::config::FluidProperties;
    use crate::field::FieldRegistry;
    use crate::mesh::CartesianGridBuilder;
    use approx::assert_relative_eq;
    use na::Vector2;

    fn props() -> FluidProperties {
        FluidProperties {
            rho1: 1.0,
            rho2: 1000.0,
            mu1: 1.0e-5,
            mu2: 1.0e-3,
            gravity: Vector2::new(0.0, -9.81),
        }
    }

    #[test]
    fn uniform_phase_two() {
        let grid = CartesianGridBuilder::new(6, 6, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);
        fields.gamma.fill(1.0);

        PropertyUpdater::new(&props()).update(&grid, &mut fields, &());

        for (r, m) in fields.rho.cells.iter().zip(&fields.mu.cells) {
            assert_relative_eq!(*r, 1000.0);
            assert_relative_eq!(*m, 1.0e-3, epsilon = 1.0e-15);
        }
        for s in fields.sg.cells.iter().chain(&fields.sg.faces) {
            assert_eq!(*s, Vector2::zeros());
        }
    }

    #[test]
    fn blending_is_clamped_and_harmonic() {
        let updater = PropertyUpdater::new(&props());
        assert_relative_eq!(updater.density(1.7), 1000.0);
        assert_relative_eq!(updater.density(-0.2), 1.0);
        assert_relative_eq!(updater.density(0.5), 500.5);
        // Kinematic viscosities 1e-5 and 1e-6, blended harmonically.
        let nu = updater.viscosity(0.5) / updater.density(0.5);
        assert_relative_eq!(nu, 1.0 / (0.5 * 1.0e5 + 0.5 * 1.0e6), epsilon = 1.0e-15);
    }

    #[test]
    fn stratified_gravity_source() {
        let grid = CartesianGridBuilder::new(4, 8, 1.0, 1.0).build();
        let mut fields = FieldRegistry::new(&grid);

        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if c.centroid.y < 0.5 { 1.0 } else { 0.0 };
        }
        for (i, f) in grid.faces().iter().enumerate() {
            fields.gamma.faces[i] = if f.centroid.y <= 0.5 { 1.0 } else { 0.0 };
        }

        PropertyUpdater::new(&props()).update(&grid, &mut fields, &());

        for (f, face) in grid.faces().iter().enumerate() {
            let s = fields.sg.faces[f];
            if face.neighbor.is_some() && (face.centroid.y - 0.5).abs() < 1.0e-12 {
                // Heavy phase below: the source pushes downward across the interface.
                assert!(s.y < 0.0);
                assert_relative_eq!(s.x, 0.0);
            } else {
                assert_eq!(s, Vector2::zeros());
            }
        }
    }
}
