//! Counters for benchmarking the stages of a time step.

use std::fmt::{Display, Formatter, Result};

pub use self::immersed_boundary_counters::ImmersedBoundaryCounters;
pub use self::solver_counters::SolverCounters;
pub use self::stages_counters::StagesCounters;
pub use self::timer::Timer;

mod immersed_boundary_counters;
mod solver_counters;
mod stages_counters;
mod timer;

/// Aggregation of all the performances counters tracked by the solver.
#[derive(Clone, Copy)]
pub struct Counters {
    /// Total number of time steps performed.
    pub nsteps: usize,
    /// Timer for a whole timestep.
    pub step_time: Timer,
    /// Counters of every stage of one time step.
    pub stages: StagesCounters,
    /// Counters of the immersed-boundary stage.
    pub ib: ImmersedBoundaryCounters,
    /// Counters of the sparse linear solves.
    pub solver: SolverCounters,
}

impl Counters {
    /// Create a new set of counters initialized to zero.
    pub fn new() -> Self {
        Counters {
            nsteps: 0,
            step_time: Timer::new(),
            stages: StagesCounters::new(),
            ib: ImmersedBoundaryCounters::new(),
            solver: SolverCounters::new(),
        }
    }

    /// Resets to zero the per-step counters. The step count is kept.
    pub fn reset(&mut self) {
        self.step_time.reset();
        self.stages.reset();
        self.ib.reset();
        self.solver.reset();
    }

    /// Enable all the counters.
    pub fn enable(&mut self) {
        self.step_time.enable();
        self.stages.enable();
        self.ib.enable();
        self.solver.enable();
    }

    /// Disable all the counters.
    pub fn disable(&mut self) {
        self.step_time.disable();
        self.stages.disable();
        self.ib.disable();
        self.solver.disable();
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Counters {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "Total timestep time: {}", self.step_time)?;
        writeln!(f, "Num steps: {}", self.nsteps)?;
        self.stages.fmt(f)?;
        self.ib.fmt(f)?;
        self.solver.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::{Counters, Timer};

    #[test]
    fn disabled_timer_does_not_measure() {
        let mut timer = Timer::new();
        timer.disable();
        timer.start();
        timer.pause();
        assert_eq!(timer.time(), 0.0);
    }

    #[test]
    fn display_lists_every_stage() {
        let mut counters = Counters::new();
        counters.ib.n_ib_cells = 12;
        counters.solver.record_solve(7);
        let text = format!("{}", counters);
        assert!(text.contains("Pressure projection time"));
        assert!(text.contains("Num IB cells: 12"));
        assert!(text.contains("Linear solver iterations: 7"));
    }
}
