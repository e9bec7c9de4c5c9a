use crate::geometry::{HGrid, HGridEntry};
use crate::math::{Point, Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid};
use crate::object::{ImmersedBody, ImmersedBodySet};

/// The role of a cell with respect to the immersed bodies.
///
/// The ordering is the precedence used when several bodies disagree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellStatus {
    /// A cell solved with the unmodified discretization.
    Fluid,
    /// A non-solid cell with a face neighbor inside a body: its momentum row is replaced by an
    /// interpolation.
    Ib,
    /// A cell whose centroid lies inside a body: forced to the rigid body velocity.
    Solid,
}

impl CellStatus {
    fn label(self) -> u8 {
        match self {
            CellStatus::Fluid => 0,
            CellStatus::Ib => 1,
            CellStatus::Solid => 2,
        }
    }

    fn from_label(label: u8) -> Self {
        match label {
            1 => CellStatus::Ib,
            2 => CellStatus::Solid,
            _ => CellStatus::Fluid,
        }
    }
}

/// The partition of the cells into FLUID, IB and SOLID sets.
#[derive(Clone, Debug, PartialEq)]
pub struct CellClassification {
    statuses: Vec<CellStatus>,
    fluid_cells: Vec<usize>,
    ib_cells: Vec<usize>,
    solid_cells: Vec<usize>,
}

impl CellClassification {
    /// Every cell FLUID.
    pub fn all_fluid(grid: &FiniteVolumeGrid) -> Self {
        Self::from_statuses(grid, vec![CellStatus::Fluid; grid.ncells()])
    }

    fn from_statuses(grid: &FiniteVolumeGrid, statuses: Vec<CellStatus>) -> Self {
        let mut result = Self {
            statuses,
            fluid_cells: Vec::new(),
            ib_cells: Vec::new(),
            solid_cells: Vec::new(),
        };

        for c in grid.local_cells() {
            match result.statuses[c] {
                CellStatus::Fluid => result.fluid_cells.push(c),
                CellStatus::Ib => result.ib_cells.push(c),
                CellStatus::Solid => result.solid_cells.push(c),
            }
        }

        result
    }

    /// Classifies the cells of `grid` against the current pose of every body.
    ///
    /// For each body, SOLID cells have their centroid inside the body and IB cells are the
    /// local non-solid face neighbors of its SOLID cells. A cell is globally SOLID if it is SOLID
    /// for any body, else IB if it is IB for any body. The per-body sets are stored on the
    /// bodies. `lookup` must contain the cells of `grid` and `margin` must be at least the
    /// distance from any cell centroid to its farthest node.
    pub fn classify(
        grid: &FiniteVolumeGrid,
        lookup: &HGrid<HGridEntry>,
        margin: Real,
        bodies: &mut ImmersedBodySet,
        comm: &dyn Communicator,
    ) -> Self {
        let cells = grid.cells();
        let mut statuses = vec![CellStatus::Fluid; grid.ncells()];
        let mut is_solid = vec![false; grid.ncells()];

        for body in bodies.values_mut() {
            let (mins, maxs) = body.shape.aabb();
            let margin = Vector::repeat(margin);

            let mut solid: Vec<usize> = lookup
                .elements_intersecting_aabb(&(mins - margin), &(maxs + margin))
                .filter_map(|e| match e {
                    HGridEntry::Cell(c) if body.shape.contains(&cells[*c].centroid) => Some(*c),
                    _ => None,
                })
                .collect();
            solid.sort_unstable();
            solid.dedup();

            solid.iter().for_each(|c| is_solid[*c] = true);

            let mut ib: Vec<usize> = solid
                .iter()
                .flat_map(|c| cells[*c].neighbors.iter())
                .map(|link| link.cell)
                .filter(|nb| !is_solid[*nb] && cells[*nb].is_local)
                .collect();
            ib.sort_unstable();
            ib.dedup();

            solid.iter().for_each(|c| is_solid[*c] = false);
            solid.retain(|c| cells[*c].is_local);

            for c in &solid {
                statuses[*c] = CellStatus::Solid;
            }
            for c in &ib {
                statuses[*c] = statuses[*c].max(CellStatus::Ib);
            }

            body.set_cells(ib, solid);
        }

        let mut labels: Vec<u8> = statuses.iter().map(|s| s.label()).collect();
        comm.exchange_labels(grid, &mut labels);

        for (status, label) in statuses.iter_mut().zip(labels) {
            *status = CellStatus::from_label(label);
        }

        Self::from_statuses(grid, statuses)
    }

    /// The status of `cell`.
    #[inline]
    pub fn status(&self, cell: usize) -> CellStatus {
        self.statuses[cell]
    }

    /// The status of every cell, ghost cells included.
    #[inline]
    pub fn statuses(&self) -> &[CellStatus] {
        &self.statuses
    }

    /// The local FLUID cells.
    #[inline]
    pub fn fluid_cells(&self) -> &[usize] {
        &self.fluid_cells
    }

    /// The local IB cells.
    #[inline]
    pub fn ib_cells(&self) -> &[usize] {
        &self.ib_cells
    }

    /// The local SOLID cells.
    #[inline]
    pub fn solid_cells(&self) -> &[usize] {
        &self.solid_cells
    }
}

/// The body whose boundary is closest to `point`.
pub fn nearest_body<'a>(bodies: &'a ImmersedBodySet, point: &Point<Real>) -> Option<&'a ImmersedBody> {
    bodies.values().min_by(|a, b| {
        a.shape
            .distance_to_boundary(point)
            .total_cmp(&b.shape.distance_to_boundary(point))
    })
}

/// The body containing `point`, the nearest one if several overlap.
pub fn body_containing<'a>(
    bodies: &'a ImmersedBodySet,
    point: &Point<Real>,
) -> Option<&'a ImmersedBody> {
    bodies
        .values()
        .filter(|b| b.shape.contains(point))
        .min_by(|a, b| {
            a.shape
                .distance_to_boundary(point)
                .total_cmp(&b.shape.distance_to_boundary(point))
        })
}
