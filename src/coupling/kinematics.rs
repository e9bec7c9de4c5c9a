use crate::math::{Real, Vector};
use crate::object::ImmersedBodySet;

/// Trait implemented by the collaborators owning the motion of the immersed bodies.
///
/// The solver calls `advance` once at the beginning of each step, then `transmit_forces` once
/// the net force on every body is known.
pub trait BodyKinematics {
    /// Moves every body by `dt` according to its current velocity.
    fn advance(&mut self, dt: Real, bodies: &mut ImmersedBodySet);

    /// Receives the net forces accumulated on the bodies during the step of length `dt`.
    fn transmit_forces(&mut self, dt: Real, bodies: &mut ImmersedBodySet);
}

/// Prescribed motion: bodies move with their current velocity, forces are ignored.
impl BodyKinematics for () {
    fn advance(&mut self, dt: Real, bodies: &mut ImmersedBodySet) {
        for body in bodies.values_mut() {
            let displacement = body.velocity * dt;
            body.shape.translate(&displacement);
        }
    }

    fn transmit_forces(&mut self, _: Real, _: &mut ImmersedBodySet) {}
}

/// Free translation under the net force, integrated with semi-implicit Euler.
///
/// The rotation rate is kept constant.
#[derive(Copy, Clone, Debug, Default)]
pub struct NewtonianTranslation {
    /// Bodies with a mass below this threshold are not accelerated.
    pub min_mass: Real,
}

impl NewtonianTranslation {
    /// A new integrator accelerating every body of positive mass.
    pub fn new() -> Self {
        Self { min_mass: 0.0 }
    }
}

impl BodyKinematics for NewtonianTranslation {
    fn advance(&mut self, dt: Real, bodies: &mut ImmersedBodySet) {
        ().advance(dt, bodies)
    }

    fn transmit_forces(&mut self, dt: Real, bodies: &mut ImmersedBodySet) {
        for body in bodies.values_mut() {
            let mass = body.mass();

            body.acceleration = if mass > self.min_mass {
                body.force() / mass
            } else {
                Vector::zeros()
            };
            body.velocity += body.acceleration * dt;
        }
    }
}
