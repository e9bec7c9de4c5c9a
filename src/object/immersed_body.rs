use crate::geometry::Shape;
use crate::math::{self, Point, Real, Vector};
use crate::object::{ContiguousArena, ContiguousArenaIndex};

/// The forces acting on a body during one step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BodyForces {
    /// Momentum exchanged with the fluid over the cells of the body.
    pub hydrodynamic: Vector<Real>,
    /// Hydrostatic pressure integrated over the boundary.
    pub buoyancy: Vector<Real>,
    /// Pull of the contact lines.
    pub capillary: Vector<Real>,
    /// Gravity acting on the body.
    pub weight: Vector<Real>,
}

impl BodyForces {
    /// The sum of all the forces.
    pub fn net(&self) -> Vector<Real> {
        self.hydrodynamic + self.buoyancy + self.capillary + self.weight
    }
}

/// A rigid body immersed in the flow.
///
/// The body does not conform to the grid: the cells it covers are found every step from its
/// shape, and the no-slip condition is imposed through a forcing term.
#[derive(Clone, Debug)]
pub struct ImmersedBody {
    /// The world-space geometry of the body.
    pub shape: Shape,
    /// Linear velocity of the centroid.
    pub velocity: Vector<Real>,
    /// Angular velocity, counter-clockwise.
    pub angular_velocity: Real,
    /// Linear acceleration of the centroid.
    pub acceleration: Vector<Real>,
    /// Angular acceleration, counter-clockwise.
    pub angular_acceleration: Real,
    /// Material density.
    pub density: Real,
    force: Vector<Real>,
    fluid_forces: BodyForces,
    ib_cells: Vec<usize>,
    solid_cells: Vec<usize>,
}

impl ImmersedBody {
    /// A body at rest.
    pub fn new(shape: Shape, density: Real) -> Self {
        Self {
            shape,
            velocity: Vector::zeros(),
            angular_velocity: 0.0,
            acceleration: Vector::zeros(),
            angular_acceleration: 0.0,
            density,
            force: Vector::zeros(),
            fluid_forces: BodyForces::default(),
            ib_cells: Vec::new(),
            solid_cells: Vec::new(),
        }
    }

    /// Sets the initial linear velocity.
    pub fn with_velocity(mut self, velocity: Vector<Real>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the initial angular velocity.
    pub fn with_angular_velocity(mut self, angular_velocity: Real) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// The centroid.
    #[inline]
    pub fn position(&self) -> Point<Real> {
        self.shape.centroid()
    }

    /// The mass, from the density and the area of the shape.
    pub fn mass(&self) -> Real {
        self.density * self.shape.area()
    }

    /// The rigid velocity at the world-space `point`: `v + ω × r`.
    pub fn velocity_at(&self, point: &Point<Real>) -> Vector<Real> {
        let r = point - self.position();
        self.velocity + math::perp(&r) * self.angular_velocity
    }

    /// The rigid acceleration at the world-space `point`, including the centripetal term.
    pub fn acceleration_at(&self, point: &Point<Real>) -> Vector<Real> {
        let r = point - self.position();
        self.acceleration + math::perp(&r) * self.angular_acceleration
            - r * (self.angular_velocity * self.angular_velocity)
    }

    /// Net force accumulated during the current step.
    #[inline]
    pub fn force(&self) -> Vector<Real> {
        self.force
    }

    /// Adds `force` to the net force.
    #[inline]
    pub fn apply_force(&mut self, force: Vector<Real>) {
        self.force += force;
    }

    /// Resets the net force.
    pub fn clear_force(&mut self) {
        self.force = Vector::zeros();
    }

    /// The net force exerted by the fluid and gravity during the last step.
    #[inline]
    pub fn hydrodynamic_force(&self) -> Vector<Real> {
        self.fluid_forces.net()
    }

    /// The breakdown of [`hydrodynamic_force`](Self::hydrodynamic_force).
    #[inline]
    pub fn fluid_forces(&self) -> &BodyForces {
        &self.fluid_forces
    }

    pub(crate) fn set_fluid_forces(&mut self, forces: BodyForces) {
        self.fluid_forces = forces;
    }

    /// The cells classified IB for this body at the last classification.
    #[inline]
    pub fn ib_cells(&self) -> &[usize] {
        &self.ib_cells
    }

    /// The cells classified SOLID for this body at the last classification.
    #[inline]
    pub fn solid_cells(&self) -> &[usize] {
        &self.solid_cells
    }

    pub(crate) fn set_cells(&mut self, ib_cells: Vec<usize>, solid_cells: Vec<usize>) {
        self.ib_cells = ib_cells;
        self.solid_cells = solid_cells;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// The unique identifier of an immersed body added to a solver.
pub struct BodyHandle(ContiguousArenaIndex);
/// The set of all immersed bodies.
pub type ImmersedBodySet = ContiguousArena<BodyHandle, ImmersedBody>;

impl From<ContiguousArenaIndex> for BodyHandle {
    #[inline]
    fn from(i: ContiguousArenaIndex) -> Self {
        BodyHandle(i)
    }
}

impl From<BodyHandle> for ContiguousArenaIndex {
    #[inline]
    fn from(handle: BodyHandle) -> Self {
        handle.0
    }
}

#[cfg(test)]
mod test {
    use super::ImmersedBody;
    use crate::geometry::{Circle, Shape};
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    #[test]
    fn rigid_velocity_field() {
        let body = ImmersedBody::new(Shape::Circle(Circle::new(Point2::new(1.0, 0.0), 0.5)), 2.0)
            .with_velocity(Vector2::new(1.0, 0.0))
            .with_angular_velocity(2.0);

        assert_relative_eq!(
            body.velocity_at(&Point2::new(1.0, 0.5)),
            Vector2::new(0.0, 0.0)
        );
        assert_relative_eq!(
            body.velocity_at(&Point2::new(1.5, 0.0)),
            Vector2::new(1.0, 1.0)
        );
        // Centripetal acceleration points toward the center.
        assert_relative_eq!(
            body.acceleration_at(&Point2::new(1.5, 0.0)),
            Vector2::new(-2.0, 0.0)
        );
        assert_relative_eq!(body.mass(), 0.5 * std::f64::consts::PI);
    }
}
