use crate::math::{Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid, HaloValue};

/// A copy of the cell and face values of a field at some earlier time.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSnapshot<T> {
    /// Cell values.
    pub cells: Vec<T>,
    /// Face values.
    pub faces: Vec<T>,
}

/// A field holding one value per cell and one value per face.
///
/// Besides the current values, a field keeps the values of the previous iteration and a bounded
/// history of previous time steps.
#[derive(Clone, Debug)]
pub struct FiniteVolumeField<T> {
    name: &'static str,
    /// Cell values.
    pub cells: Vec<T>,
    /// Face values.
    pub faces: Vec<T>,
    prev_iteration: FieldSnapshot<T>,
    old: Vec<FieldSnapshot<T>>,
}

/// A scalar field.
pub type ScalarField = FiniteVolumeField<Real>;
/// A vector field.
pub type VectorField = FiniteVolumeField<Vector<Real>>;

/// Maximum number of previous time steps kept by a field.
pub const MAX_HISTORY_DEPTH: usize = 2;

impl<T: Copy> FiniteVolumeField<T> {
    /// A field named `name` uniformly set to `value`, keeping `history` previous time steps
    /// (clamped to `1..=2`). The history is initialized with `value` too.
    pub fn new(name: &'static str, grid: &FiniteVolumeGrid, value: T, history: usize) -> Self {
        let snapshot = FieldSnapshot {
            cells: vec![value; grid.ncells()],
            faces: vec![value; grid.nfaces()],
        };
        let depth = na::clamp(history, 1, MAX_HISTORY_DEPTH);

        Self {
            name,
            cells: snapshot.cells.clone(),
            faces: snapshot.faces.clone(),
            prev_iteration: snapshot.clone(),
            old: vec![snapshot; depth],
        }
    }

    /// The name of this field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sets every cell and face value to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.iter_mut().for_each(|c| *c = value);
        self.faces.iter_mut().for_each(|f| *f = value);
    }

    /// The number of previous time steps this field keeps.
    pub fn history_depth(&self) -> usize {
        self.old.len()
    }

    /// Pushes the current values on top of the time-step history, dropping the oldest entry.
    pub fn save_previous_time_step(&mut self) {
        self.old.rotate_right(1);
        let newest = &mut self.old[0];
        newest.cells.copy_from_slice(&self.cells);
        newest.faces.copy_from_slice(&self.faces);
    }

    /// The values `i + 1` time steps ago. Requests deeper than the history return the oldest
    /// entry.
    pub fn old(&self, i: usize) -> &FieldSnapshot<T> {
        &self.old[i.min(self.old.len() - 1)]
    }

    /// Stores the current values as the previous-iteration values.
    pub fn save_previous_iteration(&mut self) {
        self.prev_iteration.cells.copy_from_slice(&self.cells);
        self.prev_iteration.faces.copy_from_slice(&self.faces);
    }

    /// The previous-iteration values.
    pub fn prev_iteration(&self) -> &FieldSnapshot<T> {
        &self.prev_iteration
    }
}

impl<T: HaloValue> FiniteVolumeField<T> {
    /// Refreshes the ghost cell values from their owning partitions.
    pub fn exchange(&mut self, comm: &dyn Communicator, grid: &FiniteVolumeGrid) {
        T::exchange(comm, grid, &mut self.cells)
    }
}
