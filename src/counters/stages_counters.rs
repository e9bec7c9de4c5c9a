use crate::counters::Timer;
use std::fmt::{Display, Formatter, Result};

/// Performance counters related to each stage of the time step.
#[derive(Default, Clone, Copy)]
pub struct StagesCounters {
    /// Time spent advancing the body kinematics.
    pub body_update_time: Timer,
    /// Time spent advecting the phase indicator.
    pub phase_advection_time: Timer,
    /// Time spent deriving the material properties and the surface tension.
    pub property_update_time: Timer,
    /// Time spent solving the momentum predictor.
    pub momentum_prediction_time: Timer,
    /// Time spent classifying cells and computing the immersed-boundary forcing.
    pub immersed_boundary_time: Timer,
    /// Time spent computing body forces and contacts.
    pub collision_time: Timer,
    /// Time spent solving the pressure projection.
    pub projection_time: Timer,
    /// Time spent correcting the velocity.
    pub correction_time: Timer,
    /// Time spent extending the pressure into the solid cells.
    pub extension_time: Timer,
}

impl StagesCounters {
    /// Create a new counter initialized to zero.
    pub fn new() -> Self {
        StagesCounters {
            body_update_time: Timer::new(),
            phase_advection_time: Timer::new(),
            property_update_time: Timer::new(),
            momentum_prediction_time: Timer::new(),
            immersed_boundary_time: Timer::new(),
            collision_time: Timer::new(),
            projection_time: Timer::new(),
            correction_time: Timer::new(),
            extension_time: Timer::new(),
        }
    }

    fn timers_mut(&mut self) -> [&mut Timer; 9] {
        [
            &mut self.body_update_time,
            &mut self.phase_advection_time,
            &mut self.property_update_time,
            &mut self.momentum_prediction_time,
            &mut self.immersed_boundary_time,
            &mut self.collision_time,
            &mut self.projection_time,
            &mut self.correction_time,
            &mut self.extension_time,
        ]
    }

    /// Enables all the counters for the simulation stages.
    pub fn enable(&mut self) {
        self.timers_mut().into_iter().for_each(|t| t.enable());
    }

    /// Disables all the counters for the simulation stages.
    pub fn disable(&mut self) {
        self.timers_mut().into_iter().for_each(|t| t.disable());
    }

    /// Resets to zero all the counters for the simulation stages.
    pub fn reset(&mut self) {
        self.timers_mut().into_iter().for_each(|t| t.reset());
    }
}

impl Display for StagesCounters {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "Body update time: {}", self.body_update_time)?;
        writeln!(f, "Phase advection time: {}", self.phase_advection_time)?;
        writeln!(f, "Property update time: {}", self.property_update_time)?;
        writeln!(
            f,
            "Momentum prediction time: {}",
            self.momentum_prediction_time
        )?;
        writeln!(f, "Immersed boundary time: {}", self.immersed_boundary_time)?;
        writeln!(f, "Collision time: {}", self.collision_time)?;
        writeln!(f, "Pressure projection time: {}", self.projection_time)?;
        writeln!(f, "Velocity correction time: {}", self.correction_time)?;
        writeln!(f, "Field extension time: {}", self.extension_time)
    }
}
