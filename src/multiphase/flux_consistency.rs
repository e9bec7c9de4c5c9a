use crate::math::{Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid};

/// Outcome of the comparison between the convective and the transported mass fluxes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FluxConsistency {
    /// Largest absolute difference of the face mass fluxes, over all partitions.
    pub max_error: Real,
    /// Whether `max_error` is within the tolerance.
    pub consistent: bool,
}

/// Compares the mass flux convecting momentum with the mass flux of the phase transport.
///
/// The momentum convection uses the average of both levels of `momentum_flux`, so its face mass
/// flux is `½ (F⁰ + F¹) · S_f`. `phase_mass_flux` is the mass flux the phase advection actually
/// transported. A mismatch beyond `tolerance` is only reported.
pub fn check_mass_flux(
    grid: &FiniteVolumeGrid,
    momentum_flux: &[Vec<Vector<Real>>; 2],
    phase_mass_flux: &[Real],
    tolerance: Real,
    comm: &dyn Communicator,
) -> FluxConsistency {
    let [new, old] = momentum_flux;
    let local = grid
        .faces()
        .iter()
        .enumerate()
        .filter(|(_, face)| grid.is_local(face.owner))
        .map(|(f, face)| {
            let convective = 0.5 * (new[f] + old[f]).dot(&face.normal);
            (convective - phase_mass_flux[f]).abs()
        })
        .fold(0.0, Real::max);

    let max_error = comm.max(local);

    FluxConsistency {
        max_error,
        consistent: max_error <= tolerance,
    }
}
