use crate::math::{Real, Vector};
use crate::mesh::FiniteVolumeGrid;

/// Trait implemented by the transport connecting the partitions of a distributed run.
///
/// Every method is a blocking collective call: all the partitions must call it in the same
/// order. Ghost exchanges overwrite the values of the non-local cells of `grid` with the
/// values held by their owning partition.
pub trait Communicator {
    /// The rank of the calling partition.
    fn rank(&self) -> usize;
    /// The number of partitions.
    fn nprocs(&self) -> usize;
    /// Global minimum.
    fn min(&self, value: Real) -> Real;
    /// Global maximum.
    fn max(&self, value: Real) -> Real;
    /// Global sum.
    fn sum(&self, value: Real) -> Real;
    /// Global component-wise sum.
    fn sum_vector(&self, value: Vector<Real>) -> Vector<Real>;
    /// Global logical or.
    fn any(&self, value: bool) -> bool;
    /// Global element-wise sum, in place.
    fn sum_slice(&self, values: &mut [Real]);
    /// Ghost exchange of one scalar per cell.
    fn exchange_scalars(&self, grid: &FiniteVolumeGrid, values: &mut [Real]);
    /// Ghost exchange of one vector per cell.
    fn exchange_vectors(&self, grid: &FiniteVolumeGrid, values: &mut [Vector<Real>]);
    /// Ghost exchange of one small integer label per cell.
    fn exchange_labels(&self, grid: &FiniteVolumeGrid, values: &mut [u8]);
}

/// The serial communicator: a single partition owning every cell.
impl Communicator for () {
    fn rank(&self) -> usize {
        0
    }

    fn nprocs(&self) -> usize {
        1
    }

    fn min(&self, value: Real) -> Real {
        value
    }

    fn max(&self, value: Real) -> Real {
        value
    }

    fn sum(&self, value: Real) -> Real {
        value
    }

    fn sum_vector(&self, value: Vector<Real>) -> Vector<Real> {
        value
    }

    fn any(&self, value: bool) -> bool {
        value
    }

    fn sum_slice(&self, _: &mut [Real]) {}

    fn exchange_scalars(&self, _: &FiniteVolumeGrid, _: &mut [Real]) {}

    fn exchange_vectors(&self, _: &FiniteVolumeGrid, _: &mut [Vector<Real>]) {}

    fn exchange_labels(&self, _: &FiniteVolumeGrid, _: &mut [u8]) {}
}

/// Cell values that can be sent through a ghost exchange.
pub trait HaloValue: Copy {
    /// Exchanges the ghost values of `values`.
    fn exchange(comm: &dyn Communicator, grid: &FiniteVolumeGrid, values: &mut [Self]);
}

impl HaloValue for Real {
    fn exchange(comm: &dyn Communicator, grid: &FiniteVolumeGrid, values: &mut [Self]) {
        comm.exchange_scalars(grid, values)
    }
}

impl HaloValue for Vector<Real> {
    fn exchange(comm: &dyn Communicator, grid: &FiniteVolumeGrid, values: &mut [Self]) {
        comm.exchange_vectors(grid, values)
    }
}
