//! Sparse linear systems: assembly and solution.

pub use self::bicgstab::BiCgStab;
pub use self::csr::CsrMatrix;
pub use self::equation::{Equation, ScalarEquation, VectorEquation};

use crate::error::Result;
use crate::math::Real;

mod bicgstab;
mod csr;
mod equation;

/// Outcome of a successful linear solve.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SolveReport {
    /// Number of iterations performed.
    pub iterations: usize,
    /// Final residual norm `|b - Ax|`.
    pub residual: Real,
}

impl SolveReport {
    /// Combines the reports of the components of a vector solve.
    pub fn merge(self, other: SolveReport) -> SolveReport {
        SolveReport {
            iterations: self.iterations + other.iterations,
            residual: self.residual.max(other.residual),
        }
    }
}

/// Trait implemented by sparse linear solvers.
pub trait LinearSolver {
    /// Solves `a x = b`, using the content of `x` as the initial guess.
    ///
    /// `system` names the system being solved, for error reporting.
    fn solve(&mut self, system: &str, a: &CsrMatrix, b: &[Real], x: &mut [Real])
        -> Result<SolveReport>;
}
