use crate::immersed_boundary::classification::CellStatus;
use crate::immersed_boundary::stencil::{least_squares_weights, Basis};
use crate::immersed_boundary::CellClassification;
use crate::math::{Point, Real};
use crate::mesh::FiniteVolumeGrid;
use crate::object::ImmersedBodySet;

/// Outcome of a pressure extension pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionReport {
    /// Number of SOLID cells whose pressure was overwritten.
    pub extended: usize,
    /// Number of SOLID cells skipped because the extrapolation was not finite.
    pub nonfinite_skips: usize,
    /// Number of SOLID cells skipped because too few non-solid cells surround them.
    pub insufficient_support: usize,
}

// Non-solid cells within two links of `cell`.
fn support_cells(
    grid: &FiniteVolumeGrid,
    classification: &CellClassification,
    cell: usize,
) -> Vec<usize> {
    let cells = grid.cells();
    let mut support: Vec<usize> = cells[cell]
        .links()
        .flat_map(|l| std::iter::once(l.cell).chain(cells[l.cell].links().map(|l2| l2.cell)))
        .filter(|c| *c != cell && classification.status(*c) != CellStatus::Solid)
        .collect();
    support.sort_unstable();
    support.dedup();
    support
}

fn interpolate_at(
    grid: &FiniteVolumeGrid,
    point: &Point<Real>,
    support: &[usize],
    values: &[Real],
    epsilon: Real,
) -> Option<Real> {
    let points: Vec<_> = support.iter().map(|c| grid.cells()[*c].centroid).collect();
    let weights = least_squares_weights(point, &points, Basis::Quadratic, epsilon)
        .or_else(|| least_squares_weights(point, &points, Basis::Linear, epsilon))?;

    Some(
        support
            .iter()
            .zip(weights.iter())
            .map(|(c, w)| values[*c] * w)
            .sum(),
    )
}

/// Extends the pressure into the SOLID cells bordering the flow.
///
/// Every SOLID cell with a neighbor (face or diagonal) outside its body gets
/// `p = p_b + dP |x − x_b|` where `x_b` is the nearest boundary point, `p_b` and `ρ_b` are
/// interpolated there from the surrounding non-solid cells, and
/// `dP = −(2 u_bn² ∂ρ/∂n + ρ_b a_bn)` with `u_bn`, `a_bn` the normal body velocity and
/// acceleration at `x_b`. Non-finite extrapolations leave the cell unchanged and are counted.
pub fn extend_pressure(
    grid: &FiniteVolumeGrid,
    classification: &CellClassification,
    bodies: &ImmersedBodySet,
    rho: &[Real],
    p: &mut [Real],
    epsilon: Real,
) -> ExtensionReport {
    let cells = grid.cells();
    let mut report = ExtensionReport::default();

    for body in bodies.values() {
        for c in body.solid_cells() {
            let centroid = cells[*c].centroid;
            let borders_flow = cells[*c]
                .links()
                .any(|l| !body.shape.contains(&cells[l.cell].centroid));

            if !borders_flow {
                continue;
            }

            let support = support_cells(grid, classification, *c);
            let bp = body.shape.nearest_intersect(&centroid);
            let ns = body.shape.nearest_edge_unit_normal(&centroid);

            let (pb, rhob) = match (
                interpolate_at(grid, &bp, &support, p, epsilon),
                interpolate_at(grid, &bp, &support, rho, epsilon),
            ) {
                (Some(pb), Some(rhob)) => (pb, rhob),
                _ => {
                    report.insufficient_support += 1;
                    continue;
                }
            };

            let distance = (centroid - bp).norm();
            let ubn = body.velocity_at(&bp).dot(&ns);
            let abn = body.acceleration_at(&bp).dot(&ns);
            let d_rho = (rho[*c] - rhob) / distance;
            let dp = -(2.0 * ubn * ubn * d_rho + rhob * abn);
            let extended = pb + dp * distance;

            if extended.is_finite() {
                p[*c] = extended;
                report.extended += 1;
            } else {
                log::warn!(
                    "skipping the pressure extension of cell {}: non-finite correction",
                    cells[*c].global_id
                );
                report.nonfinite_skips += 1;
            }
        }
    }

    report
}
