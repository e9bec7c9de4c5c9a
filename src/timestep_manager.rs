use std::f64::consts::PI;

use crate::math::Real;
use crate::mesh::{Communicator, FiniteVolumeGrid};

/// Structure responsible for regulating the timestep length of the simulation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimestepManager {
    capillary_time_step: Real,
    max_growth: Real,
}

impl TimestepManager {
    /// Initialize a timestep manager for the given grid and fluid pair.
    ///
    /// This computes the capillary-wave stability limit
    /// `min_f sqrt((rho1 + rho2) |d_f|³ / (4π σ))` over all the interior faces of every
    /// partition. The limit is infinite without surface tension.
    pub fn new(
        grid: &FiniteVolumeGrid,
        rho1: Real,
        rho2: Real,
        sigma: Real,
        comm: &dyn Communicator,
    ) -> Self {
        let local = if sigma > 0.0 {
            grid.faces()
                .iter()
                .enumerate()
                .filter(|(_, f)| !f.is_boundary() && grid.is_local(f.owner))
                .map(|(i, _)| {
                    let delta = grid.face_delta(i).norm();
                    ((rho1 + rho2) * delta.powi(3) / (4.0 * PI * sigma)).sqrt()
                })
                .fold(Real::INFINITY, Real::min)
        } else {
            Real::INFINITY
        };

        Self {
            capillary_time_step: comm.min(local),
            max_growth: 1.2,
        }
    }

    /// The capillary-wave stability limit.
    pub fn capillary_time_step(&self) -> Real {
        self.capillary_time_step
    }

    /// The largest step keeping the Courant number below `max_co`.
    ///
    /// `courant` is the Courant number reached with the previous step `prev_dt`. The step never
    /// grows by more than 20% at once and never exceeds the capillary limit.
    pub fn max_time_step(&self, max_co: Real, prev_dt: Real, courant: Real) -> Real {
        let growth_limited = self.max_growth * prev_dt;
        let courant_limited = if courant > 0.0 {
            max_co * prev_dt / courant
        } else {
            growth_limited
        };

        courant_limited
            .min(growth_limited)
            .min(self.capillary_time_step)
    }
}

#[cfg(test)]
mod test {
    use super::TimestepManager;
    use crate::mesh::CartesianGridBuilder;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn capillary_limit() {
        let grid = CartesianGridBuilder::new(4, 4, 1.0, 2.0).build();
        let manager = TimestepManager::new(&grid, 1.0, 1000.0, 0.07, &());
        let expected = (1001.0 * 0.25f64.powi(3) / (4.0 * PI * 0.07)).sqrt();
        assert_relative_eq!(manager.capillary_time_step(), expected);

        let free = TimestepManager::new(&grid, 1.0, 1000.0, 0.0, &());
        assert!(free.capillary_time_step().is_infinite());
    }

    #[test]
    fn courant_and_growth_limits() {
        let grid = CartesianGridBuilder::new(2, 2, 1.0, 1.0).build();
        let manager = TimestepManager::new(&grid, 1.0, 1.0, 0.0, &());

        assert_relative_eq!(manager.max_time_step(0.5, 0.1, 1.0), 0.05);
        assert_relative_eq!(manager.max_time_step(0.5, 0.1, 0.1), 0.12);
        assert_relative_eq!(manager.max_time_step(0.5, 0.1, 0.0), 0.12);
    }
}
