//! Coupling between the flow and the motion of the immersed bodies.

pub use self::body_forces::{
    body_forces, boundary_samples, capillary_force, mean_surrounding_density, momentum_exchange,
    pressure_buoyancy, BoundarySample, BOUNDARY_ELEMENTS,
};
pub use self::kinematics::{BodyKinematics, NewtonianTranslation};

mod body_forces;
mod kinematics;
