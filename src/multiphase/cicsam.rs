//! CICSAM face blending between upwind and a compressive downwind-biased scheme.

use crate::field::ScalarField;
use crate::math::{Real, Vector};
use crate::mesh::{BoundaryKind, FiniteVolumeGrid};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const SMALL: Real = 1.0e-12;

/// The donor and acceptor cells of a face for the flux `flux` (positive from owner to
/// neighbor). The acceptor is `None` on the boundary.
#[inline]
pub fn donor_acceptor(grid: &FiniteVolumeGrid, face: usize, flux: Real) -> (usize, Option<usize>) {
    let f = &grid.faces()[face];

    match f.neighbor {
        Some(n) if flux < 0.0 => (n, Some(f.owner)),
        n => (f.owner, n),
    }
}

/// The CICSAM blending weight of one face.
///
/// `gamma_d`, `gamma_a` are the donor and acceptor values, `grad_d` the donor gradient, `d` the
/// vector from donor to acceptor centroids and `courant` the donor-based face Courant number.
pub fn face_weight(
    gamma_d: Real,
    gamma_a: Real,
    grad_d: &Vector<Real>,
    d: &Vector<Real>,
    courant: Real,
    k: Real,
) -> Real {
    let gamma_u = na::clamp(gamma_a - 2.0 * grad_d.dot(d), 0.0, 1.0);
    let denominator = gamma_a - gamma_u;

    if denominator.abs() < SMALL {
        return 0.0;
    }

    let gamma_dn = (gamma_d - gamma_u) / denominator;

    let gamma_fn = if (0.0..=1.0).contains(&gamma_dn) {
        let cbc = if courant > SMALL {
            (gamma_dn / courant).min(1.0)
        } else {
            1.0
        };
        let uq = ((8.0 * courant * gamma_dn + (1.0 - courant) * (6.0 * gamma_dn + 3.0)) / 8.0)
            .min(cbc);

        let norms = grad_d.norm() * d.norm();
        let cos_theta = if norms > SMALL {
            grad_d.dot(d).abs() / norms
        } else {
            1.0
        };
        // (cos 2θ + 1) / 2 = cos² θ
        let k_theta = (k * cos_theta * cos_theta).min(1.0);

        k_theta * cbc + (1.0 - k_theta) * uq
    } else {
        gamma_dn
    };

    if (1.0 - gamma_dn).abs() < SMALL {
        0.0
    } else {
        na::clamp((gamma_fn - gamma_dn) / (1.0 - gamma_dn), 0.0, 1.0)
    }
}

/// The CICSAM scheme.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cicsam {
    /// Blending constant of the interface-angle switch.
    pub k: Real,
}

impl Cicsam {
    /// The scheme with the blending constant `k`.
    pub fn new(k: Real) -> Self {
        Self { k }
    }

    /// The blending weight of every face. Boundary faces get zero (pure upwind).
    pub fn face_weights(
        &self,
        grid: &FiniteVolumeGrid,
        u_faces: &[Vector<Real>],
        gamma: &[Real],
        grad_gamma: &[Vector<Real>],
        dt: Real,
    ) -> Vec<Real> {
        let mut beta = vec![0.0; grid.nfaces()];
        let cells = grid.cells();
        let faces = grid.faces();
        let k = self.k;

        par_iter_mut!(beta).enumerate().for_each(|(f, b)| {
            let face = &faces[f];
            let flux = u_faces[f].dot(&face.normal);

            if let (donor, Some(acceptor)) = donor_acceptor(grid, f, flux) {
                let d = cells[acceptor].centroid - cells[donor].centroid;
                let courant = flux.abs() * dt / cells[donor].volume;
                *b = face_weight(
                    gamma[donor],
                    gamma[acceptor],
                    &grad_gamma[donor],
                    &d,
                    courant,
                    k,
                );
            }
        });

        beta
    }
}

/// The value of the phase indicator at `face` for the flux `flux`.
///
/// Interior faces blend donor and acceptor with `beta`. On the boundary, inflow takes the
/// imposed value of inlets and outflow takes the owner value.
pub fn face_value(
    grid: &FiniteVolumeGrid,
    face: usize,
    flux: Real,
    beta: Real,
    gamma: &[Real],
) -> Real {
    match donor_acceptor(grid, face, flux) {
        (donor, Some(acceptor)) => (1.0 - beta) * gamma[donor] + beta * gamma[acceptor],
        (owner, None) => match grid.boundary_kind(face) {
            Some(BoundaryKind::Inlet { gamma: inlet, .. }) if flux < 0.0 => inlet,
            _ => gamma[owner],
        },
    }
}

/// Face values of the phase indicator for every face.
pub fn face_values(
    grid: &FiniteVolumeGrid,
    u_faces: &[Vector<Real>],
    beta: &[Real],
    gamma: &ScalarField,
    out: &mut [Real],
) {
    let faces = grid.faces();

    par_iter_mut!(out).enumerate().for_each(|(f, g)| {
        let flux = u_faces[f].dot(&faces[f].normal);
        *g = face_value(grid, f, flux, beta[f], &gamma.cells);
    });
}
