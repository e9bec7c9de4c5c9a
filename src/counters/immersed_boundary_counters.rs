use crate::counters::Timer;
use std::fmt::{Display, Formatter, Result};

/// Performance counters related to the immersed-boundary stage.
#[derive(Default, Clone, Copy)]
pub struct ImmersedBoundaryCounters {
    /// Time spent classifying the cells.
    pub classification_time: Timer,
    /// Time spent building the interpolation stencils.
    pub stencil_time: Timer,
    /// Number of cells classified as IB at the last classification.
    pub n_ib_cells: usize,
    /// Number of cells classified as SOLID at the last classification.
    pub n_solid_cells: usize,
    /// Number of pressure extensions skipped because of a non-finite correction.
    pub nonfinite_extension_skips: usize,
    /// Number of pressure extensions skipped because too few cells surround them.
    pub insufficient_extension_support: usize,
}

impl ImmersedBoundaryCounters {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        ImmersedBoundaryCounters {
            classification_time: Timer::new(),
            stencil_time: Timer::new(),
            n_ib_cells: 0,
            n_solid_cells: 0,
            nonfinite_extension_skips: 0,
            insufficient_extension_support: 0,
        }
    }

    /// Enables all the immersed-boundary timers.
    pub fn enable(&mut self) {
        self.classification_time.enable();
        self.stencil_time.enable();
    }

    /// Disables all the immersed-boundary timers.
    pub fn disable(&mut self) {
        self.classification_time.disable();
        self.stencil_time.disable();
    }

    /// Resets to zero all the immersed-boundary counters.
    pub fn reset(&mut self) {
        self.classification_time.reset();
        self.stencil_time.reset();
        self.n_ib_cells = 0;
        self.n_solid_cells = 0;
        self.nonfinite_extension_skips = 0;
        self.insufficient_extension_support = 0;
    }
}

impl Display for ImmersedBoundaryCounters {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "Classification time: {}", self.classification_time)?;
        writeln!(f, "Stencil construction time: {}", self.stencil_time)?;
        writeln!(f, "Num IB cells: {}", self.n_ib_cells)?;
        writeln!(f, "Num SOLID cells: {}", self.n_solid_cells)?;
        writeln!(
            f,
            "Skipped non-finite extensions: {}",
            self.nonfinite_extension_skips
        )?;
        writeln!(
            f,
            "Skipped unsupported extensions: {}",
            self.insufficient_extension_support
        )
    }
}
