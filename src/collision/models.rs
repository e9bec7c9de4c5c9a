use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::positive;
use crate::error::{Result, SolverError};
use crate::math::{Point, Real, Vector};

/// A contact between a disk and another surface, seen from the disk.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    /// Unit vector from the other surface toward the disk center.
    pub normal: Vector<Real>,
    /// Center-to-center (or center-to-wall) distance.
    pub distance: Real,
    /// Sum of the radii in contact.
    pub radii: Real,
    /// Center of the disk minus the reference point of the other surface.
    pub offset: Vector<Real>,
}

impl Contact {
    /// The contact between the disks `(xp, rp)` and `(xq, rq)`.
    pub fn between_disks(xp: &Point<Real>, rp: Real, xq: &Point<Real>, rq: Real) -> Self {
        Self::new(xp - xq, rp + rq)
    }

    /// The contact between the disk `(xp, r)` and the wall point `xw`.
    pub fn with_wall(xp: &Point<Real>, r: Real, xw: &Point<Real>) -> Self {
        Self::new(xp - xw, r)
    }

    fn new(offset: Vector<Real>, radii: Real) -> Self {
        let distance = offset.norm();
        let normal = if distance > 0.0 {
            offset / distance
        } else {
            Vector::zeros()
        };

        Self {
            normal,
            distance,
            radii,
            offset,
        }
    }

    /// Distance between the two surfaces, negative when they overlap.
    #[inline]
    pub fn gap(&self) -> Real {
        self.distance - self.radii
    }

    /// How far the gap is below `range`: positive inside the interaction range.
    #[inline]
    pub fn penetration(&self, range: Real) -> Real {
        self.radii + range - self.distance
    }
}

/// Hertzian repulsion with linear damping, active when the gap falls below the range.
///
/// The force jumps from zero to the damping term when a body enters the range.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SoftSphere {
    /// Stiffness between bodies.
    pub k_particle: Real,
    /// Damping between bodies.
    pub eta_particle: Real,
    /// Activation range between bodies.
    pub range_particle: Real,
    /// Stiffness against walls.
    pub k_wall: Real,
    /// Damping against walls.
    pub eta_wall: Real,
    /// Activation range against walls.
    pub range_wall: Real,
}

impl Default for SoftSphere {
    fn default() -> Self {
        Self {
            k_particle: 1.0e4,
            eta_particle: 1.0,
            range_particle: 0.01,
            k_wall: 1.0e4,
            eta_wall: 1.0,
            range_wall: 0.01,
        }
    }
}

impl SoftSphere {
    pub(crate) fn validate(&self) -> Result<()> {
        positive("soft_sphere.k_particle", self.k_particle)?;
        positive("soft_sphere.range_particle", self.range_particle)?;
        positive("soft_sphere.k_wall", self.k_wall)?;
        positive("soft_sphere.range_wall", self.range_wall)?;
        non_negative("soft_sphere.eta_particle", self.eta_particle)?;
        non_negative("soft_sphere.eta_wall", self.eta_wall)
    }

    /// The force on `p` from `q`, `v_rel` being the velocity of `q` relative to `p`.
    pub fn pair_force(&self, contact: &Contact, v_rel: &Vector<Real>) -> Vector<Real> {
        Self::force(self.k_particle, self.eta_particle, self.range_particle, contact, v_rel)
    }

    /// The force on a body moving at `velocity` from a wall.
    pub fn wall_force(&self, contact: &Contact, velocity: &Vector<Real>) -> Vector<Real> {
        Self::force(self.k_wall, self.eta_wall, self.range_wall, contact, &-velocity)
    }

    fn force(k: Real, eta: Real, range: Real, contact: &Contact, v_rel: &Vector<Real>) -> Vector<Real> {
        let overlap = contact.penetration(range);

        if overlap <= 0.0 {
            Vector::zeros()
        } else {
            contact.normal * (k * overlap.powf(1.5)) + v_rel * eta
        }
    }
}

/// Undamped quadratic repulsion, active when the gap falls below the range.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Spring {
    /// Stiffness parameter between bodies, the force scales as `1 / eps_particle`.
    pub eps_particle: Real,
    /// Activation range between bodies.
    pub range_particle: Real,
    /// Stiffness parameter against walls.
    pub eps_wall: Real,
    /// Activation range against walls.
    pub range_wall: Real,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            eps_particle: 1.0e-4,
            range_particle: 0.01,
            eps_wall: 1.0e-4,
            range_wall: 0.01,
        }
    }
}

impl Spring {
    pub(crate) fn validate(&self) -> Result<()> {
        positive("spring.eps_particle", self.eps_particle)?;
        positive("spring.range_particle", self.range_particle)?;
        positive("spring.eps_wall", self.eps_wall)?;
        positive("spring.range_wall", self.range_wall)
    }

    /// The force on `p` from `q`.
    pub fn pair_force(&self, contact: &Contact) -> Vector<Real> {
        Self::force(self.eps_particle, self.range_particle, contact)
    }

    /// The force on a body from a wall.
    pub fn wall_force(&self, contact: &Contact) -> Vector<Real> {
        Self::force(self.eps_wall, self.range_wall, contact)
    }

    fn force(eps: Real, range: Real, contact: &Contact) -> Vector<Real> {
        let overlap = contact.penetration(range);

        if overlap <= 0.0 {
            Vector::zeros()
        } else {
            contact.offset / eps * (overlap * overlap)
        }
    }
}

/// Lubrication correction for the thin fluid films the grid cannot resolve.
///
/// The force opposes the relative motion and vanishes continuously when the gap reaches the
/// range.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Lubrication {
    /// Dynamic viscosity of the film.
    pub mu: Real,
    /// Activation range between bodies.
    pub range_particle: Real,
    /// Activation range against walls.
    pub range_wall: Real,
    /// Smallest gap, relative to the effective radius, used in the resistance functions.
    pub min_gap_ratio: Real,
}

impl Default for Lubrication {
    fn default() -> Self {
        Self {
            mu: 1.0e-3,
            range_particle: 0.01,
            range_wall: 0.01,
            min_gap_ratio: 1.0e-4,
        }
    }
}

impl Lubrication {
    pub(crate) fn validate(&self) -> Result<()> {
        positive("lubrication.mu", self.mu)?;
        positive("lubrication.range_particle", self.range_particle)?;
        positive("lubrication.range_wall", self.range_wall)?;
        positive("lubrication.min_gap_ratio", self.min_gap_ratio)
    }

    /// Resistance function between two disks.
    pub fn lambda(eps: Real) -> Real {
        1.0 / (2.0 * eps) - 9.0 / 20.0 * eps.ln() - 3.0 / 56.0 * eps * eps.ln()
    }

    /// Resistance function between a disk and a wall.
    pub fn lambda_wall(eps: Real) -> Real {
        1.0 / eps - 1.0 / 5.0 * eps.ln() - 1.0 / 21.0 * eps * eps.ln()
    }

    /// The force on `p` (radius `rp`) from `q` (radius `rq`), `v_rel = v_p − v_q`.
    pub fn pair_force(&self, contact: &Contact, rp: Real, rq: Real, v_rel: &Vector<Real>) -> Vector<Real> {
        let r_eff = rp * rq / (rp + rq);
        self.force(r_eff, self.range_particle, contact, v_rel, Self::lambda)
    }

    /// The force on a body of radius `r` moving at `velocity` from a wall.
    pub fn wall_force(&self, contact: &Contact, r: Real, velocity: &Vector<Real>) -> Vector<Real> {
        self.force(r, self.range_wall, contact, velocity, Self::lambda_wall)
    }

    fn force(
        &self,
        r_eff: Real,
        range: Real,
        contact: &Contact,
        v_rel: &Vector<Real>,
        lambda: fn(Real) -> Real,
    ) -> Vector<Real> {
        if contact.penetration(range) <= 0.0 {
            return Vector::zeros();
        }

        let eps = (contact.gap() / r_eff).max(self.min_gap_ratio);
        let eps0 = range / r_eff;
        v_rel * (-6.0 * PI * self.mu * r_eff * (lambda(eps) - lambda(eps0)))
    }
}

fn non_negative(name: &str, value: Real) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SolverError::Configuration(format!(
            "`{}` must be non-negative and finite, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod test {
    use super::{Contact, Lubrication, SoftSphere, Spring};
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};
    use std::f64::consts::PI;

    const R: f64 = 0.1;

    // A disk of radius `R` centered `height` above the wall point at the origin.
    fn wall_contact(height: f64) -> Contact {
        Contact::with_wall(&Point2::new(0.0, height), R, &Point2::origin())
    }

    // Kinetic energy after a head-on collision of two unit-mass disks closing at speed 2.
    fn head_on_energy(model: &SoftSphere) -> (f64, f64) {
        let dt = 1.0e-5;
        let mut x = [Point2::new(0.0, 0.0), Point2::new(2.0 * R + 0.02, 0.0)];
        let mut v = [Vector2::new(1.0, 0.0), Vector2::new(-1.0, 0.0)];
        let energy = |v: &[Vector2<f64>; 2]| 0.5 * (v[0].norm_squared() + v[1].norm_squared());
        let initial = energy(&v);

        for _ in 0..100_000 {
            let contact = Contact::between_disks(&x[0], R, &x[1], R);
            let f = model.pair_force(&contact, &(v[1] - v[0]));

            v[0] += f * dt;
            v[1] -= f * dt;
            x[0] += v[0] * dt;
            x[1] += v[1] * dt;

            if contact.penetration(model.range_particle) < 0.0 && v[1].x > v[0].x {
                break;
            }
        }

        assert!(v[1].x > v[0].x, "the disks must bounce apart");
        (initial, energy(&v))
    }

    #[test]
    fn soft_sphere_damping_dissipates_energy() {
        let elastic = SoftSphere {
            eta_particle: 0.0,
            ..SoftSphere::default()
        };
        let (initial, after) = head_on_energy(&elastic);
        assert_relative_eq!(after, initial, max_relative = 1.0e-3);

        let (initial, after) = head_on_energy(&SoftSphere::default());
        assert!(after < 0.99 * initial);
        assert!(after > 0.1 * initial);

        // While closing in, the damping alone pushes the first disk back.
        let contact = Contact::between_disks(&Point2::origin(), R, &Point2::new(2.0 * R, 0.0), R);
        let undamped = SoftSphere {
            eta_particle: 0.0,
            ..SoftSphere::default()
        };
        let v_rel = Vector2::new(-2.0, 0.0);
        let damping = SoftSphere::default().pair_force(&contact, &v_rel)
            - undamped.pair_force(&contact, &v_rel);
        assert!(damping.x < 0.0);
    }

    #[test]
    fn soft_sphere_wall_force() {
        let model = SoftSphere::default();
        let at_rest = Vector2::zeros();

        let inside = wall_contact(R + 0.5 * model.range_wall);
        let overlap: f64 = 0.5 * model.range_wall;
        assert_relative_eq!(
            model.wall_force(&inside, &at_rest),
            Vector2::new(0.0, model.k_wall * overlap.powf(1.5))
        );

        // Moving toward the wall is resisted, moving away is held back.
        let down = Vector2::new(0.0, -0.5);
        let toward = model.wall_force(&inside, &down);
        assert_relative_eq!(toward.y, model.k_wall * overlap.powf(1.5) + 0.5 * model.eta_wall);
        assert!(model.wall_force(&inside, &-down).y < toward.y);

        let beyond = wall_contact(R + 2.0 * model.range_wall);
        assert_eq!(model.wall_force(&beyond, &down), Vector2::zeros());
    }

    #[test]
    fn spring_wall_force() {
        let model = Spring::default();
        let height = R + 0.5 * model.range_wall;
        let overlap = 0.5 * model.range_wall;

        let force = model.wall_force(&wall_contact(height));
        assert_relative_eq!(force, Vector2::new(0.0, height * overlap * overlap / model.eps_wall));
        assert!(force.y > 0.0);

        assert_eq!(
            model.wall_force(&wall_contact(R + 2.0 * model.range_wall)),
            Vector2::zeros()
        );
    }

    #[test]
    fn lubrication_resistance_functions() {
        assert_relative_eq!(Lubrication::lambda(0.1), 6.048_498_3, epsilon = 1.0e-6);
        assert_relative_eq!(Lubrication::lambda_wall(0.1), 10.471_481_7, epsilon = 1.0e-6);
        // Both diverge as the gap closes.
        assert!(Lubrication::lambda_wall(1.0e-3) > 100.0 * Lubrication::lambda_wall(1.0));
        assert!(Lubrication::lambda(1.0e-3) > 100.0 * Lubrication::lambda(1.0));
    }

    #[test]
    fn lubrication_wall_force() {
        let model = Lubrication::default();
        let gap = 0.5 * model.range_wall;
        let velocity = Vector2::new(0.0, -0.2);

        let force = model.wall_force(&wall_contact(R + gap), R, &velocity);
        let expected = 6.0
            * PI
            * model.mu
            * R
            * (Lubrication::lambda_wall(gap / R) - Lubrication::lambda_wall(model.range_wall / R))
            * 0.2;
        assert_relative_eq!(force, Vector2::new(0.0, expected), max_relative = 1.0e-12);
        assert!(force.y > 0.0);

        // Overlapping disks use the smallest gap instead of a negative one.
        let touching = model.wall_force(&wall_contact(0.9 * R), R, &velocity);
        let clamped = 6.0
            * PI
            * model.mu
            * R
            * (Lubrication::lambda_wall(model.min_gap_ratio)
                - Lubrication::lambda_wall(model.range_wall / R))
            * 0.2;
        assert_relative_eq!(touching.y, clamped, max_relative = 1.0e-12);

        let beyond = wall_contact(R + 2.0 * model.range_wall);
        assert_eq!(model.wall_force(&beyond, R, &velocity), Vector2::zeros());
    }
}
