use crate::math::Real;
use thiserror::Error;

/// Errors that terminate a time step.
///
/// None of them is retried and no state is rolled back: the fields are left as they were when
/// the failing stage aborted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// An immersed-boundary cell has fewer than six support points for its quadratic stencil.
    #[error("cell {cell} on partition {partition} has a degenerate interpolation stencil ({support} support points, at least 6 required)")]
    DegenerateStencil {
        /// Local index of the immersed-boundary cell.
        cell: usize,
        /// Rank of the partition owning the cell.
        partition: usize,
        /// Number of support points found.
        support: usize,
    },
    /// Invalid or inconsistent solver configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A geometric query the model does not implement for this shape.
    #[error("{model} does not support {shape} shapes")]
    UnsupportedShape {
        /// Name of the model issuing the query.
        model: &'static str,
        /// Name of the shape it was issued against.
        shape: &'static str,
    },
    /// The sparse linear solver broke down or ran out of iterations.
    #[error("linear solve of `{system}` failed after {iterations} iterations (residual {residual:e})")]
    LinearSolver {
        /// Name of the system being solved.
        system: String,
        /// Iterations performed before giving up.
        iterations: usize,
        /// Last residual norm.
        residual: Real,
    },
}

impl SolverError {
    /// Whether this error comes from the configuration (stencils and settings) rather than
    /// from the numerics.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SolverError::DegenerateStencil { .. } | SolverError::Configuration(_)
        )
    }
}

/// Result type of every fallible solver operation.
pub type Result<T> = std::result::Result<T, SolverError>;
