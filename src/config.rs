//! Solver configuration.
//!
//! Every structure deserializes with missing fields taking their default value, so a
//! configuration file only needs to list what differs from the defaults.

use serde::{Deserialize, Serialize};

use crate::collision::{Lubrication, SoftSphere, Spring};
use crate::error::{Result, SolverError};
use crate::math::{Real, Vector};

/// The complete configuration of a [`FractionalStep`](crate::FractionalStep) solver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct SolverConfig {
    /// Material properties of both phases and gravity.
    pub fluid: FluidProperties,
    /// Parameters of the interface-capturing scheme.
    pub cicsam: CicsamParameters,
    /// Parameters of the immersed-boundary stencils.
    pub immersed_boundary: ImmersedBoundaryParameters,
    /// Active contact models.
    pub collisions: CollisionConfig,
    /// Parameters of the sparse linear solver.
    pub linear_solver: LinearSolverParameters,
    /// Diagnostics and consistency checks.
    pub diagnostics: DiagnosticsParameters,
}

impl SolverConfig {
    /// Checks that every parameter is physically meaningful.
    pub fn validate(&self) -> Result<()> {
        self.fluid.validate()?;
        self.cicsam.validate()?;
        self.immersed_boundary.validate()?;
        self.collisions.validate()?;
        self.linear_solver.validate()?;
        self.diagnostics.validate()
    }
}

pub(crate) fn positive(name: &str, value: Real) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SolverError::Configuration(format!(
            "`{}` must be positive and finite, got {}",
            name, value
        )))
    }
}

/// Densities and dynamic viscosities of the two phases.
///
/// `gamma = 0` is phase 1 (usually the gas) and `gamma = 1` is phase 2.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FluidProperties {
    /// Density of phase 1.
    pub rho1: Real,
    /// Density of phase 2.
    pub rho2: Real,
    /// Dynamic viscosity of phase 1.
    pub mu1: Real,
    /// Dynamic viscosity of phase 2.
    pub mu2: Real,
    /// Gravitational acceleration.
    pub gravity: Vector<Real>,
}

impl Default for FluidProperties {
    fn default() -> Self {
        Self {
            rho1: 1.205,
            rho2: 998.0,
            mu1: 1.8e-5,
            mu2: 1.0e-3,
            gravity: Vector::new(0.0, -9.81),
        }
    }
}

impl FluidProperties {
    fn validate(&self) -> Result<()> {
        positive("rho1", self.rho1)?;
        positive("rho2", self.rho2)?;
        positive("mu1", self.mu1)?;
        positive("mu2", self.mu2)?;

        if self.gravity.iter().all(|g| g.is_finite()) {
            Ok(())
        } else {
            Err(SolverError::Configuration(
                "`gravity` must be finite".to_string(),
            ))
        }
    }
}

/// Parameters of the CICSAM interface-capturing scheme.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CicsamParameters {
    /// Blending constant of the interface-angle switch. `0` gives pure ULTIMATE-QUICKEST,
    /// larger values favor the compressive Hyper-C bound.
    pub k: Real,
}

impl Default for CicsamParameters {
    fn default() -> Self {
        Self { k: 1.0 }
    }
}

impl CicsamParameters {
    fn validate(&self) -> Result<()> {
        if self.k >= 0.0 && self.k.is_finite() {
            Ok(())
        } else {
            Err(SolverError::Configuration(format!(
                "`cicsam.k` must be non-negative, got {}",
                self.k
            )))
        }
    }
}

/// Parameters of the immersed-boundary stencils.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ImmersedBoundaryParameters {
    /// Singular values below this threshold are discarded by the pseudo-inverse.
    pub pseudo_inverse_epsilon: Real,
}

impl Default for ImmersedBoundaryParameters {
    fn default() -> Self {
        Self {
            pseudo_inverse_epsilon: 1.0e-12,
        }
    }
}

impl ImmersedBoundaryParameters {
    fn validate(&self) -> Result<()> {
        positive(
            "immersed_boundary.pseudo_inverse_epsilon",
            self.pseudo_inverse_epsilon,
        )
    }
}

/// The contact models active between bodies and between bodies and walls.
///
/// Soft-sphere and spring repulsions are mutually exclusive. Lubrication may be combined with
/// either of them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct CollisionConfig {
    /// Hertzian soft-sphere repulsion with damping.
    pub soft_sphere: Option<SoftSphere>,
    /// Undamped quadratic spring repulsion.
    pub spring: Option<Spring>,
    /// Lubrication correction for under-resolved thin films.
    pub lubrication: Option<Lubrication>,
}

impl CollisionConfig {
    fn validate(&self) -> Result<()> {
        if self.soft_sphere.is_some() && self.spring.is_some() {
            return Err(SolverError::Configuration(
                "ambiguous contact models: soft-sphere and spring repulsions are both configured"
                    .to_string(),
            ));
        }

        if let Some(model) = &self.soft_sphere {
            model.validate()?;
        }
        if let Some(model) = &self.spring {
            model.validate()?;
        }
        if let Some(model) = &self.lubrication {
            model.validate()?;
        }

        Ok(())
    }
}

/// Parameters of the iterative sparse solver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LinearSolverParameters {
    /// Maximum number of iterations before the solve is reported as failed.
    pub max_iterations: usize,
    /// Convergence threshold relative to the norm of the right-hand side.
    pub relative_tolerance: Real,
    /// Convergence threshold on the residual norm.
    pub absolute_tolerance: Real,
}

impl Default for LinearSolverParameters {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            relative_tolerance: 1.0e-10,
            absolute_tolerance: 1.0e-13,
        }
    }
}

impl LinearSolverParameters {
    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::Configuration(
                "`linear_solver.max_iterations` must be at least 1".to_string(),
            ));
        }

        positive("linear_solver.relative_tolerance", self.relative_tolerance)?;
        positive("linear_solver.absolute_tolerance", self.absolute_tolerance)
    }
}

/// Per-step diagnostics settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DiagnosticsParameters {
    /// Rank of the only partition logging per-step diagnostics.
    pub report_partition: usize,
    /// Largest tolerated difference, per face, between the momentum flux produced by the phase
    /// advection and the one used by the momentum equation.
    pub mass_flux_tolerance: Real,
}

impl Default for DiagnosticsParameters {
    fn default() -> Self {
        Self {
            report_partition: 0,
            mass_flux_tolerance: 1.0e-8,
        }
    }
}

impl DiagnosticsParameters {
    fn validate(&self) -> Result<()> {
        positive("diagnostics.mass_flux_tolerance", self.mass_flux_tolerance)
    }
}
