//! Gradient evaluation and face-to-cell reconstruction.

use crate::field::ScalarField;
use crate::math::{Matrix, Real, Vector};
use crate::mesh::FiniteVolumeGrid;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Green-Gauss cell gradient of `phi`.
///
/// Interior face values are linearly interpolated from the cells; boundary faces use the face
/// values stored in `phi`.
pub fn green_gauss(grid: &FiniteVolumeGrid, phi: &ScalarField, out: &mut [Vector<Real>]) {
    let cells = grid.cells();
    let faces = grid.faces();

    par_iter_mut!(out).enumerate().for_each(|(i, grad)| {
        let cell = &cells[i];
        let sum = cell.faces.iter().fold(Vector::zeros(), |acc, f| {
            let phi_f = grid.interpolate(*f, &phi.cells, phi.faces[*f]);
            acc + faces[*f].outward_normal(i) * phi_f
        });
        *grad = sum / cell.volume;
    })
}

/// Face gradients of `phi` along the line joining the owner centroid to the neighbor centroid
/// (or to the face centroid on the boundary).
pub fn face_gradients(grid: &FiniteVolumeGrid, phi: &ScalarField, out: &mut [Vector<Real>]) {
    let faces = grid.faces();

    par_iter_mut!(out).enumerate().for_each(|(f, grad)| {
        let face = &faces[f];
        let d = grid.face_delta(f);
        let phi_n = match face.neighbor {
            Some(n) => phi.cells[n],
            None => phi.faces[f],
        };

        *grad = d * ((phi_n - phi.cells[face.owner]) / d.norm_squared());
    })
}

/// Reconstructs cell vectors from the normal components of face vectors.
///
/// Each cell value is the least-squares fit `v` of `v · n̂_f = v_f · n̂_f`, weighted by the face
/// areas. Cells whose faces do not span the plane get zero.
pub fn reconstruct(grid: &FiniteVolumeGrid, face_values: &[Vector<Real>], out: &mut [Vector<Real>]) {
    reconstruct_with(grid, |f| face_values[f], out)
}

/// Density-weighted reconstruction: `v_P = w_P R[v_f / w_f]`.
///
/// This is the reconstruction balancing face and cell forces divided by the density, so that a
/// hydrostatic pressure gradient cancels the gravity source exactly at the cells.
pub fn reconstruct_weighted(
    grid: &FiniteVolumeGrid,
    face_values: &[Vector<Real>],
    cell_weights: &[Real],
    face_weights: &[Real],
    out: &mut [Vector<Real>],
) {
    reconstruct_with(grid, |f| face_values[f] / face_weights[f], out);
    out.iter_mut()
        .zip(cell_weights.iter())
        .for_each(|(v, w)| *v *= *w);
}

fn reconstruct_with<F>(grid: &FiniteVolumeGrid, face_value: F, out: &mut [Vector<Real>])
where
    F: Fn(usize) -> Vector<Real> + Sync,
{
    let cells = grid.cells();
    let faces = grid.faces();

    par_iter_mut!(out).enumerate().for_each(|(i, v)| {
        let mut lhs = Matrix::zeros();
        let mut rhs = Vector::zeros();

        for f in &cells[i].faces {
            let face = &faces[*f];
            let area = face.area();
            let n = face.normal / area;
            lhs += n * n.transpose() * area;
            rhs += n * (face_value(*f).dot(&n) * area);
        }

        *v = lhs
            .try_inverse()
            .map(|inv| inv * rhs)
            .unwrap_or_else(Vector::zeros);
    })
}
