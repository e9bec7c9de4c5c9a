use na::{DMatrix, DVector};

use crate::error::{Result, SolverError};
use crate::immersed_boundary::classification::{nearest_body, CellStatus};
use crate::immersed_boundary::CellClassification;
use crate::math::{Point, Real, Vector};
use crate::mesh::FiniteVolumeGrid;
use crate::object::ImmersedBodySet;

/// Minimum number of support points of a quadratic stencil.
pub const MIN_QUADRATIC_SUPPORT: usize = 6;

/// A point where the interpolated field is known.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SupportPoint {
    /// The centroid of a cell: the field value is the cell value.
    Cell(usize),
    /// A point of a body boundary, carrying the rigid motion of the body there.
    Boundary {
        /// Location on the boundary.
        point: Point<Real>,
        /// Body velocity at `point`.
        velocity: Vector<Real>,
    },
}

impl SupportPoint {
    /// The location of this support point.
    pub fn location(&self, grid: &FiniteVolumeGrid) -> Point<Real> {
        match self {
            SupportPoint::Cell(c) => grid.cells()[*c].centroid,
            SupportPoint::Boundary { point, .. } => *point,
        }
    }
}

/// The polynomial space of a least-squares fit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Basis {
    /// `{x², y², xy, x, y, 1}`.
    Quadratic,
    /// `{x, y, 1}`.
    Linear,
}

impl Basis {
    /// The number of basis functions.
    pub fn len(self) -> usize {
        match self {
            Basis::Quadratic => 6,
            Basis::Linear => 3,
        }
    }

    fn row(self, x: Real, y: Real) -> Vec<Real> {
        match self {
            Basis::Quadratic => vec![x * x, y * y, x * y, x, y, 1.0],
            Basis::Linear => vec![x, y, 1.0],
        }
    }
}

/// Least-squares weights interpolating a field at `center` from its values at `points`.
///
/// Coordinates are taken relative to `center` and scaled by the farthest point, so the
/// interpolant at `center` is the constant coefficient of the fit. Returns `None` if there are
/// fewer points than basis functions or if the pseudo-inverse fails.
pub fn least_squares_weights(
    center: &Point<Real>,
    points: &[Point<Real>],
    basis: Basis,
    epsilon: Real,
) -> Option<DVector<Real>> {
    let ncols = basis.len();

    if points.len() < ncols {
        return None;
    }

    let scale = points
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, Real::max);
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let rows: Vec<Real> = points
        .iter()
        .flat_map(|p| {
            let r = (p - center) / scale;
            basis.row(r.x, r.y)
        })
        .collect();
    let a = DMatrix::from_row_slice(points.len(), ncols, &rows);
    let pinv = a.pseudo_inverse(epsilon).ok()?;

    Some(pinv.row(ncols - 1).transpose())
}

/// The constrained least-squares interpolation of an IB cell.
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationStencil {
    /// The IB cell.
    pub cell: usize,
    /// The support points: non-solid neighbor cells first, then boundary points.
    pub supports: Vec<SupportPoint>,
    /// One weight per support point.
    pub weights: DVector<Real>,
}

impl InterpolationStencil {
    /// Builds the stencil of the IB cell `cell`.
    ///
    /// The support set is every non-solid neighbor (face and diagonal) of the cell, the nearest
    /// boundary point of each of those neighbors that is itself IB, and the nearest boundary
    /// point of the cell. Fails with [`SolverError::DegenerateStencil`] if it has fewer than six
    /// points.
    pub fn build(
        cell: usize,
        grid: &FiniteVolumeGrid,
        classification: &CellClassification,
        bodies: &ImmersedBodySet,
        epsilon: Real,
    ) -> Result<Self> {
        let cells = grid.cells();
        let centroid = cells[cell].centroid;
        let mut supports = Vec::new();
        let mut boundary_points = Vec::new();

        let boundary_point = |p: &Point<Real>| {
            nearest_body(bodies, p).map(|body| {
                let point = body.shape.nearest_intersect(p);
                SupportPoint::Boundary {
                    point,
                    velocity: body.velocity_at(&point),
                }
            })
        };

        for link in cells[cell].links() {
            match classification.status(link.cell) {
                CellStatus::Solid => {}
                CellStatus::Fluid => supports.push(SupportPoint::Cell(link.cell)),
                CellStatus::Ib => {
                    supports.push(SupportPoint::Cell(link.cell));
                    boundary_points.extend(boundary_point(&cells[link.cell].centroid));
                }
            }
        }

        boundary_points.extend(boundary_point(&centroid));
        supports.extend(boundary_points);

        let degenerate = || SolverError::DegenerateStencil {
            cell,
            partition: grid.partition(),
            support: supports.len(),
        };

        if supports.len() < MIN_QUADRATIC_SUPPORT {
            return Err(degenerate());
        }

        let points: Vec<_> = supports.iter().map(|s| s.location(grid)).collect();
        let weights = least_squares_weights(&centroid, &points, Basis::Quadratic, epsilon)
            .ok_or_else(degenerate)?;

        Ok(Self {
            cell,
            supports,
            weights,
        })
    }

    /// Interpolates a field at the cell centroid, `value` giving the field at each support.
    pub fn interpolate<T, F>(&self, value: F) -> T
    where
        T: std::ops::Mul<Real, Output = T> + std::ops::Add<Output = T> + num::Zero,
        F: Fn(&SupportPoint) -> T,
    {
        self.supports
            .iter()
            .zip(self.weights.iter())
            .fold(T::zero(), |acc, (s, w)| acc + value(s) * *w)
    }
}

#[cfg(test)]
mod test {
    use super::{least_squares_weights, Basis, InterpolationStencil, SupportPoint};
    use crate::geometry::{Circle, HGrid, Shape};
    use crate::immersed_boundary::CellClassification;
    use crate::mesh::CartesianGridBuilder;
    use crate::object::{ImmersedBody, ImmersedBodySet};
    use crate::SolverError;
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    fn f(p: &Point2<f64>) -> f64 {
        p.x * p.x + 2.0 * p.x * p.y + p.y
    }

    #[test]
    fn quadratic_weights_are_exact() {
        let center = Point2::new(0.3, -0.2);
        let points: Vec<_> = [
            (0.0, 0.0),
            (1.0, 0.1),
            (-0.4, 0.7),
            (0.5, -0.9),
            (0.9, 0.8),
            (-0.6, -0.5),
            (0.2, 0.4),
        ]
        .iter()
        .map(|(x, y)| Point2::new(*x, *y))
        .collect();

        let w = least_squares_weights(&center, &points, Basis::Quadratic, 1.0e-12).unwrap();
        let value: f64 = points.iter().zip(w.iter()).map(|(p, w)| f(p) * w).sum();
        assert_relative_eq!(value, f(&center), epsilon = 1.0e-10);
        assert!(least_squares_weights(&center, &points[..5], Basis::Quadratic, 1.0e-12).is_none());
    }

    #[test]
    fn stencils_interpolate_quadratics_exactly() {
        let grid = CartesianGridBuilder::new(24, 24, 1.2, 1.2).build();
        let lookup = HGrid::from_grid(&grid, 0.05);
        let mut bodies = ImmersedBodySet::new();
        let shape = Shape::Circle(Circle::new(Point2::new(0.61, 0.58), 0.21));
        let _ = bodies.insert(ImmersedBody::new(shape, 1.0));

        let classification = CellClassification::classify(&grid, &lookup, 0.05, &mut bodies, &());
        assert!(!classification.ib_cells().is_empty());

        for cell in classification.ib_cells() {
            let stencil =
                InterpolationStencil::build(*cell, &grid, &classification, &bodies, 1.0e-12)
                    .unwrap();
            assert!(stencil.supports.len() >= 6);

            let value: f64 = stencil.interpolate(|s| f(&s.location(&grid)));
            assert_relative_eq!(value, f(&grid.cells()[*cell].centroid), epsilon = 1.0e-9);

            let boundary_points = stencil
                .supports
                .iter()
                .filter(|s| matches!(s, SupportPoint::Boundary { .. }))
                .count();
            assert!(boundary_points >= 1);
        }
    }

    #[test]
    fn boundary_supports_carry_the_rigid_velocity() {
        let grid = CartesianGridBuilder::new(20, 20, 1.0, 1.0).build();
        let lookup = HGrid::from_grid(&grid, 0.05);
        let mut bodies = ImmersedBodySet::new();
        let center = Point2::new(0.5, 0.5);
        let mut body = ImmersedBody::new(Shape::Circle(Circle::new(center, 0.2)), 1.0);
        body.velocity = Vector2::new(0.3, -0.1);
        body.angular_velocity = 1.5;
        let _ = bodies.insert(body);

        let classification = CellClassification::classify(&grid, &lookup, 0.05, &mut bodies, &());

        for cell in classification.ib_cells() {
            let stencil =
                InterpolationStencil::build(*cell, &grid, &classification, &bodies, 1.0e-12)
                    .unwrap();

            for support in &stencil.supports {
                if let SupportPoint::Boundary { point, velocity } = support {
                    let r = point - center;
                    assert_relative_eq!(r.norm(), 0.2, epsilon = 1.0e-12);
                    let rigid = Vector2::new(0.3 - 1.5 * r.y, -0.1 + 1.5 * r.x);
                    assert_relative_eq!(*velocity, rigid, epsilon = 1.0e-12);
                }
            }
        }
    }

    #[test]
    fn degenerate_stencil_is_a_configuration_error() {
        // A single row of cells: an IB cell has at most one non-solid neighbor.
        let grid = CartesianGridBuilder::new(3, 1, 3.0, 1.0).build();
        let lookup = HGrid::from_grid(&grid, 1.0);
        let mut bodies = ImmersedBodySet::new();
        let shape = Shape::Circle(Circle::new(Point2::new(0.5, 0.5), 0.3));
        let _ = bodies.insert(ImmersedBody::new(shape, 1.0));

        let classification = CellClassification::classify(&grid, &lookup, 1.0, &mut bodies, &());
        assert_eq!(classification.ib_cells(), &[1]);

        match InterpolationStencil::build(1, &grid, &classification, &bodies, 1.0e-12) {
            Err(SolverError::DegenerateStencil {
                cell, partition, ..
            }) => {
                assert_eq!(cell, 1);
                assert_eq!(partition, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
