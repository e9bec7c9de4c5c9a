//! The fractional-step time integrator.

use crate::collision::CollisionEngine;
use crate::config::SolverConfig;
use crate::counters::{Counters, SolverCounters};
use crate::coupling::{self, BodyKinematics};
use crate::error::{Result, SolverError};
use crate::field::{gradient, FieldRegistry};
use crate::immersed_boundary::{CellClassification, ImmersedBoundary};
use crate::linalg::{BiCgStab, CsrMatrix, LinearSolver, SolveReport};
use crate::math::Real;
use crate::mesh::{BoundaryKind, Communicator, FiniteVolumeGrid};
use crate::multiphase::{self, Cicsam, PhaseAdvector, PropertyUpdater, SurfaceTensionModel};
use crate::object::{BodyHandle, ImmersedBody, ImmersedBodySet};
use crate::TimestepManager;

mod momentum;
mod pressure;

/// The outcome of each linear solve of a time step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StageResiduals {
    /// Corrector of the phase advection.
    pub phase: SolveReport,
    /// Unforced momentum predictor.
    pub momentum_predictor: SolveReport,
    /// Forcing of the immersed-boundary and SOLID cells.
    pub ib_constraint: SolveReport,
    /// Momentum predictor with the updated forcing.
    pub momentum_forced: SolveReport,
    /// Pressure projection.
    pub pressure: SolveReport,
}

/// Diagnostics of one time step, reduced over all partitions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepDiagnostics {
    /// Largest net volumetric flux out of a cell after the projection.
    pub divergence_error: Real,
    /// Largest outflow Courant number after the projection.
    pub courant_number: Real,
    /// Outcome of every linear solve.
    pub per_stage_residual: StageResiduals,
    /// Largest mismatch between the mass flux of the phase transport and the mass flux convecting
    /// momentum.
    pub mass_flux_error: Real,
    /// Whether `mass_flux_error` exceeded the configured tolerance.
    pub mass_flux_inconsistent: bool,
    /// Pressure extensions skipped because of a non-finite correction.
    pub nonfinite_extension_skips: usize,
    /// Pressure extensions skipped because too few non-solid cells surround the SOLID cell.
    pub insufficient_extension_support: usize,
}

// Routes the solves through the performance counters.
struct CountedSolver<'a> {
    inner: &'a mut dyn LinearSolver,
    counters: &'a mut SolverCounters,
}

impl<'a> LinearSolver for CountedSolver<'a> {
    fn solve(
        &mut self,
        system: &str,
        a: &CsrMatrix,
        b: &[Real],
        x: &mut [Real],
    ) -> Result<SolveReport> {
        self.counters.linear_solve_time.resume();
        let result = self.inner.solve(system, a, b, x);
        self.counters.linear_solve_time.pause();

        if let Ok(report) = &result {
            self.counters.record_solve(report.iterations);
        }

        result
    }
}

/// Fractional-step solver for two-phase flows with immersed bodies.
///
/// The solver owns the grid, the fields and the bodies. Each call to
/// [`advance_step`](Self::advance_step) runs the whole pipeline once:
/// body motion, phase advection, property update, momentum prediction, immersed-boundary
/// forcing, contact forces, pressure projection, velocity correction and pressure extension.
pub struct FractionalStep {
    /// Performance counters of the solver.
    pub counters: Counters,
    config: SolverConfig,
    grid: FiniteVolumeGrid,
    fields: FieldRegistry,
    bodies: ImmersedBodySet,
    ib: ImmersedBoundary,
    phase: PhaseAdvector,
    properties: PropertyUpdater,
    collisions: CollisionEngine,
    surface_tension: Box<dyn SurfaceTensionModel>,
    solver: Box<dyn LinearSolver>,
    comm: Box<dyn Communicator>,
    timestep_manager: TimestepManager,
    initialized: bool,
}

impl FractionalStep {
    /// Creates a solver on `grid`.
    ///
    /// The configuration is validated and the capillary time-step bound is computed over all
    /// the partitions, so every partition must call this at the same time.
    pub fn new(
        config: SolverConfig,
        grid: FiniteVolumeGrid,
        surface_tension: Box<dyn SurfaceTensionModel>,
        solver: Box<dyn LinearSolver>,
        comm: Box<dyn Communicator>,
    ) -> Result<Self> {
        config.validate()?;

        let properties = PropertyUpdater::new(&config.fluid);
        let phase = PhaseAdvector::new(Cicsam::new(config.cicsam.k), properties.clone());
        let collisions = CollisionEngine::from_config(&config.collisions)?;
        let timestep_manager = TimestepManager::new(
            &grid,
            config.fluid.rho1,
            config.fluid.rho2,
            surface_tension.sigma(),
            comm.as_ref(),
        );

        if comm.rank() == config.diagnostics.report_partition {
            log::info!(
                "Capillary time step bound: {:e}",
                timestep_manager.capillary_time_step()
            );
        }

        let mut fields = FieldRegistry::new(&grid);
        properties.update(&grid, &mut fields, comm.as_ref());

        Ok(Self {
            counters: Counters::new(),
            fields,
            bodies: ImmersedBodySet::new(),
            ib: ImmersedBoundary::new(&grid, config.immersed_boundary.clone()),
            phase,
            properties,
            collisions,
            surface_tension,
            solver,
            comm,
            timestep_manager,
            config,
            grid,
            initialized: false,
        })
    }

    /// A single-partition solver with BiCGStab and no surface tension.
    pub fn serial(config: SolverConfig, grid: FiniteVolumeGrid) -> Result<Self> {
        let solver = BiCgStab::new(config.linear_solver.clone());
        Self::new(config, grid, Box::new(()), Box::new(solver), Box::new(()))
    }

    /// The configuration of this solver.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The grid of the local partition.
    pub fn grid(&self) -> &FiniteVolumeGrid {
        &self.grid
    }

    /// All the fields.
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// All the fields, for setting initial conditions.
    ///
    /// Call [`initialize`](Self::initialize) after modifying the phase indicator.
    pub fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.fields
    }

    /// Adds an immersed body.
    pub fn add_body(&mut self, body: ImmersedBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Removes an immersed body.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<ImmersedBody> {
        self.bodies.remove(handle)
    }

    /// The immersed bodies.
    pub fn bodies(&self) -> &ImmersedBodySet {
        &self.bodies
    }

    /// The immersed bodies, for prescribing their motion.
    pub fn bodies_mut(&mut self) -> &mut ImmersedBodySet {
        &mut self.bodies
    }

    /// The classification of the cells at the last step.
    pub fn classification(&self) -> &CellClassification {
        self.ib.classification()
    }

    /// The capillary-wave stability bound of the time step.
    pub fn capillary_time_step(&self) -> Real {
        self.timestep_manager.capillary_time_step()
    }

    /// The largest time step keeping the Courant number below `max_co`, given the previous
    /// step `prev_dt` and the diagnostics it produced.
    pub fn max_time_step(&self, max_co: Real, prev_dt: Real, last: &StepDiagnostics) -> Real {
        self.timestep_manager
            .max_time_step(max_co, prev_dt, last.courant_number)
    }

    /// Makes the derived fields consistent with the initial phase indicator and body poses.
    pub fn initialize(&mut self) -> Result<()> {
        let grid = &self.grid;
        let comm = self.comm.as_ref();
        let gamma = &mut self.fields.gamma;

        gamma.exchange(comm, grid);
        for (f, face) in grid.faces().iter().enumerate() {
            gamma.faces[f] = match grid.boundary_kind(f) {
                Some(BoundaryKind::Inlet { gamma: inlet, .. }) => inlet,
                Some(_) => gamma.cells[face.owner],
                None => grid.interpolate(f, &gamma.cells, 0.0),
            };
        }
        gradient::green_gauss(grid, gamma, &mut self.fields.grad_gamma.cells);
        self.fields.grad_gamma.exchange(comm, grid);

        self.ib.update(grid, &mut self.bodies, comm)?;
        self.properties.update(grid, &mut self.fields, comm);
        self.update_surface_tension();
        pressure::update_gradient(&self.grid, &mut self.fields, self.comm.as_ref());
        self.initialized = true;

        Ok(())
    }

    fn update_surface_tension(&mut self) {
        let fields = &mut self.fields;
        self.surface_tension.compute(
            &self.grid,
            &fields.gamma,
            &fields.grad_gamma,
            &fields.rho,
            self.ib.classification(),
            &mut fields.fst,
        );
        fields.fst.exchange(self.comm.as_ref(), &self.grid);
    }

    /// Advances the simulation by `dt` with bodies moving at their current velocity.
    pub fn advance_step(&mut self, dt: Real) -> Result<StepDiagnostics> {
        self.advance_step_with_kinematics(dt, &mut ())
    }

    /// Advances the simulation by `dt`, the bodies being moved by `kinematics`.
    ///
    /// Fails with a configuration error if [`initialize`](Self::initialize) was never called.
    pub fn advance_step_with_kinematics(
        &mut self,
        dt: Real,
        kinematics: &mut dyn BodyKinematics,
    ) -> Result<StepDiagnostics> {
        if !self.initialized {
            return Err(SolverError::Configuration(
                "initialize() must be called before advancing the solver".to_string(),
            ));
        }

        self.counters.reset();
        self.counters.nsteps += 1;
        self.counters.step_time.start();

        let mut diagnostics = StepDiagnostics::default();
        let report = self.comm.rank() == self.config.diagnostics.report_partition;

        log::debug!("Updating body positions.");
        self.counters.stages.body_update_time.resume();
        kinematics.advance(dt, &mut self.bodies);
        self.counters.stages.body_update_time.pause();

        log::debug!("Advecting the phase indicator.");
        self.counters.stages.phase_advection_time.resume();
        diagnostics.per_stage_residual.phase = self.phase.advect(
            &self.grid,
            &mut self.fields,
            dt,
            &mut CountedSolver {
                inner: self.solver.as_mut(),
                counters: &mut self.counters.solver,
            },
            self.comm.as_ref(),
        )?;
        self.counters.stages.phase_advection_time.pause();

        log::debug!("Updating the physical properties.");
        self.counters.stages.property_update_time.resume();
        self.fields.rho.save_previous_time_step();
        self.properties
            .update(&self.grid, &mut self.fields, self.comm.as_ref());
        self.update_surface_tension();
        self.counters.stages.property_update_time.pause();

        log::debug!("Solving the momentum predictor.");
        self.counters.stages.momentum_prediction_time.resume();
        self.check_mass_flux(&mut diagnostics, report);
        self.fields.u.save_previous_time_step();
        diagnostics.per_stage_residual.momentum_predictor = self.solve_momentum(dt)?;
        self.counters.stages.momentum_prediction_time.pause();

        log::debug!("Computing the immersed-boundary forcing.");
        self.counters.stages.immersed_boundary_time.resume();
        let (ib_constraint, momentum_forced) = self.apply_immersed_boundaries(dt)?;
        diagnostics.per_stage_residual.ib_constraint = ib_constraint;
        diagnostics.per_stage_residual.momentum_forced = momentum_forced;
        self.counters.stages.immersed_boundary_time.pause();

        log::debug!("Computing the body forces.");
        self.counters.stages.collision_time.resume();
        self.apply_body_forces(dt, kinematics)?;
        self.counters.stages.collision_time.pause();

        log::debug!("Solving the pressure equation.");
        self.counters.stages.projection_time.resume();
        diagnostics.per_stage_residual.pressure = pressure::solve(
            &self.grid,
            &mut self.fields,
            dt,
            &mut CountedSolver {
                inner: self.solver.as_mut(),
                counters: &mut self.counters.solver,
            },
            self.comm.as_ref(),
        )?;
        self.counters.stages.projection_time.pause();

        self.counters.stages.correction_time.resume();
        pressure::correct_velocity(&self.grid, &mut self.fields, dt, self.comm.as_ref());
        self.ib
            .enforce_rigid_motion(&self.grid, &self.bodies, &mut self.fields.u.cells);
        self.fields.u.exchange(self.comm.as_ref(), &self.grid);
        diagnostics.divergence_error =
            pressure::max_divergence_error(&self.grid, &self.fields.u.faces, self.comm.as_ref());
        diagnostics.courant_number =
            pressure::max_courant_number(&self.grid, &self.fields.u.faces, dt, self.comm.as_ref());
        self.counters.stages.correction_time.pause();

        log::debug!("Extending the pressure into the bodies.");
        self.counters.stages.extension_time.resume();
        let extension = self.ib.extend_pressure(
            &self.grid,
            &self.bodies,
            &self.fields.rho.cells,
            &mut self.fields.p.cells,
        );
        let skips = self.comm.sum(extension.nonfinite_skips as Real) as usize;
        self.counters.ib.nonfinite_extension_skips += skips;
        diagnostics.nonfinite_extension_skips = skips;
        let unsupported = self.comm.sum(extension.insufficient_support as Real) as usize;
        self.counters.ib.insufficient_extension_support += unsupported;
        diagnostics.insufficient_extension_support = unsupported;

        if unsupported > 0 && report {
            log::warn!(
                "{} SOLID cells kept their pressure: too few surrounding cells to extend it",
                unsupported
            );
        }
        self.fields.p.exchange(self.comm.as_ref(), &self.grid);
        pressure::update_gradient(&self.grid, &mut self.fields, self.comm.as_ref());
        self.counters.stages.extension_time.pause();

        self.counters.step_time.pause();

        if report {
            log::info!(
                "Step {}: max divergence error = {:.4e}, max Courant number = {:.4}",
                self.counters.nsteps,
                diagnostics.divergence_error,
                diagnostics.courant_number
            );
        }

        Ok(diagnostics)
    }

    fn check_mass_flux(&self, diagnostics: &mut StepDiagnostics, report: bool) {
        let fields = &self.fields;
        let tolerance = self.config.diagnostics.mass_flux_tolerance;
        let check = multiphase::check_mass_flux(
            &self.grid,
            &fields.momentum_flux,
            &fields.phase_mass_flux,
            tolerance,
            self.comm.as_ref(),
        );

        if !check.consistent && report {
            log::warn!(
                "Mass flux inconsistency: max face error {:e} exceeds {:e}",
                check.max_error,
                tolerance
            );
        }

        diagnostics.mass_flux_error = check.max_error;
        diagnostics.mass_flux_inconsistent = !check.consistent;
    }

    fn solve_momentum(&mut self, dt: Real) -> Result<SolveReport> {
        let eqn = momentum::assemble(&self.grid, &self.fields, dt);
        let report = eqn.solve(
            &mut CountedSolver {
                inner: self.solver.as_mut(),
                counters: &mut self.counters.solver,
            },
            &mut self.fields.u.cells,
        )?;
        self.fields.u.exchange(self.comm.as_ref(), &self.grid);
        Ok(report)
    }

    fn apply_immersed_boundaries(&mut self, dt: Real) -> Result<(SolveReport, SolveReport)> {
        let comm = self.comm.as_ref();

        self.counters.ib.classification_time.resume();
        self.ib.reclassify(&self.grid, &mut self.bodies, comm);
        self.counters.ib.classification_time.pause();

        self.counters.ib.stencil_time.resume();
        self.ib.build_stencils(&self.grid, &self.bodies)?;
        self.counters.ib.stencil_time.pause();

        self.counters.ib.n_ib_cells = self.ib.classification().ib_cells().len();
        self.counters.ib.n_solid_cells = self.ib.classification().solid_cells().len();

        let constraint = self.ib.compute_forcing(
            &self.grid,
            &self.bodies,
            &self.fields.rho.cells,
            &self.fields.u.cells,
            dt,
            &mut self.fields.fib.cells,
            &mut CountedSolver {
                inner: self.solver.as_mut(),
                counters: &mut self.counters.solver,
            },
        )?;
        self.fields.fib.exchange(comm, &self.grid);

        let forced = self.solve_momentum(dt)?;

        let FieldRegistry { u, rho, grad_p, .. } = &mut self.fields;
        for i in self.grid.local_cells() {
            u.cells[i] += grad_p.cells[i] * (dt / rho.cells[i]);
        }
        u.exchange(self.comm.as_ref(), &self.grid);

        momentum::face_velocities(
            &self.grid,
            self.ib.classification(),
            &self.bodies,
            &mut self.fields,
            dt,
        );

        Ok((constraint, forced))
    }

    fn apply_body_forces(&mut self, dt: Real, kinematics: &mut dyn BodyKinematics) -> Result<()> {
        let comm = self.comm.as_ref();
        let fluid = &self.config.fluid;
        let report = comm.rank() == self.config.diagnostics.report_partition;

        for body in self.bodies.values_mut() {
            let fluid_density = coupling::mean_surrounding_density(
                body,
                &self.grid,
                &self.fields.rho.cells,
                fluid.rho1,
                comm,
            );
            let forces = coupling::body_forces(
                body,
                &self.grid,
                &self.fields,
                dt,
                &fluid.gravity,
                self.surface_tension.as_ref(),
                fluid_density,
                comm,
            );

            if report {
                log::debug!(
                    "Body forces: hydrodynamic = {:?}, buoyancy = {:?}, capillary = {:?}, weight = {:?}, net = {:?}",
                    forces.hydrodynamic,
                    forces.buoyancy,
                    forces.capillary,
                    forces.weight,
                    forces.net()
                );
            }

            body.set_fluid_forces(forces);
            body.apply_force(forces.net());
        }

        self.collisions
            .apply(&mut self.bodies, &self.grid, self.ib.lookup())?;
        kinematics.transmit_forces(dt, &mut self.bodies);

        for body in self.bodies.values_mut() {
            body.clear_force();
        }

        Ok(())
    }
}
