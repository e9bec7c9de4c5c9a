use crate::counters::Timer;
use std::fmt::{Display, Formatter, Result};

/// Performance counters related to the sparse linear solves.
#[derive(Default, Clone, Copy)]
pub struct SolverCounters {
    /// Time spent inside the linear solver.
    pub linear_solve_time: Timer,
    /// Number of linear systems solved.
    pub nsolves: usize,
    /// Total number of iterations over all the solves.
    pub iterations: usize,
}

impl SolverCounters {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        SolverCounters {
            linear_solve_time: Timer::new(),
            nsolves: 0,
            iterations: 0,
        }
    }

    /// Records one completed solve.
    pub fn record_solve(&mut self, iterations: usize) {
        self.nsolves += 1;
        self.iterations += iterations;
    }

    /// Enables all the counters for the solver.
    pub fn enable(&mut self) {
        self.linear_solve_time.enable();
    }

    /// Disables all the counters for the solver.
    pub fn disable(&mut self) {
        self.linear_solve_time.disable();
    }

    /// Resets to zero all the counters for the solver.
    pub fn reset(&mut self) {
        self.linear_solve_time.reset();
        self.nsolves = 0;
        self.iterations = 0;
    }
}

impl Display for SolverCounters {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "Linear solve time: {}", self.linear_solve_time)?;
        writeln!(f, "Num linear solves: {}", self.nsolves)?;
        writeln!(f, "Linear solver iterations: {}", self.iterations)
    }
}
