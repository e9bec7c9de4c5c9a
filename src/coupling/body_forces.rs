use crate::field::FieldRegistry;
use crate::geometry::BoundaryElement;
use crate::math::{self, Real, Vector};
use crate::mesh::{Communicator, FiniteVolumeGrid};
use crate::multiphase::SurfaceTensionModel;
use crate::object::{BodyForces, ImmersedBody};

/// Number of boundary elements of the surface integrals of a body.
pub const BOUNDARY_ELEMENTS: usize = 64;

/// Mean density of the fluid in the IB cells around `body`, reduced over all partitions.
///
/// Falls back to `default` if the body has no IB cell anywhere.
pub fn mean_surrounding_density(
    body: &ImmersedBody,
    grid: &FiniteVolumeGrid,
    rho: &[Real],
    default: Real,
    comm: &dyn Communicator,
) -> Real {
    let (mass, volume) = body
        .ib_cells()
        .iter()
        .filter(|c| grid.is_local(**c))
        .fold((0.0, 0.0), |(m, v), c| {
            let vol = grid.cells()[*c].volume;
            (m + rho[*c] * vol, v + vol)
        });
    let (mass, volume) = (comm.sum(mass), comm.sum(volume));

    if volume > 0.0 {
        mass / volume
    } else {
        default
    }
}

/// Momentum balance over the IB and SOLID cells of `body`, reduced over all partitions.
///
/// The force is the rate of change of the momentum of those cells, plus the momentum convected
/// out of them by both levels of the momentum flux (upwinded as in the momentum predictor),
/// minus the gravity, surface tension and immersed-boundary sources acting on them.
pub fn momentum_exchange(
    body: &ImmersedBody,
    grid: &FiniteVolumeGrid,
    fields: &FieldRegistry,
    dt: Real,
    comm: &dyn Communicator,
) -> Vector<Real> {
    let cells = grid.cells();
    let faces = grid.faces();
    let u_old = &fields.u.old(0).cells;
    let rho_old = &fields.rho.old(0).cells;

    let local = body
        .ib_cells()
        .iter()
        .chain(body.solid_cells())
        .filter(|c| grid.is_local(**c))
        .fold(Vector::zeros(), |mut acc, c| {
            let c = *c;
            let v = cells[c].volume;

            acc += (fields.u.cells[c] * fields.rho.cells[c] - u_old[c] * rho_old[c]) * (v / dt);

            for f in &cells[c].faces {
                let normal = faces[*f].outward_normal(c);
                let outside = match faces[*f].other(c) {
                    Some(nb) => u_old[nb],
                    None => fields.u.faces[*f],
                };

                for flux in &fields.momentum_flux {
                    let m = 0.5 * flux[*f].dot(&normal);
                    acc += if m >= 0.0 { u_old[c] * m } else { outside * m };
                }
            }

            acc - (fields.sg.cells[c] + fields.fst.cells[c] + fields.fib.cells[c]) * v
        });

    comm.sum_vector(local)
}

/// The fluid state at one boundary element of a body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundarySample {
    /// The boundary element.
    pub element: BoundaryElement,
    /// Density next to the element.
    pub rho: Real,
    /// Phase indicator next to the element, if any IB cell is close enough to tell.
    pub gamma: Option<Real>,
}

/// Samples the density and the phase indicator along the boundary of `body`.
///
/// Each element takes the inverse-distance average of the IB cells of the body closer than two
/// cell widths. Elements without such a cell get `fallback_density` and no phase indicator.
pub fn boundary_samples(
    body: &ImmersedBody,
    grid: &FiniteVolumeGrid,
    fields: &FieldRegistry,
    fallback_density: Real,
    comm: &dyn Communicator,
) -> Vec<BoundarySample> {
    let cells = grid.cells();
    let elements = body.shape.boundary_elements(BOUNDARY_ELEMENTS);
    // (Σ w ρ, Σ w γ, Σ w) per element.
    let mut sums = vec![0.0; 3 * elements.len()];

    for (e, element) in elements.iter().enumerate() {
        for c in body.ib_cells().iter().filter(|c| grid.is_local(**c)) {
            let volume = cells[*c].volume;
            let d2 = (cells[*c].centroid - element.point).norm_squared();

            if d2 < 4.0 * volume {
                let w = 1.0 / d2.max(1.0e-12 * volume);
                sums[3 * e] += w * fields.rho.cells[*c];
                sums[3 * e + 1] += w * fields.gamma.cells[*c];
                sums[3 * e + 2] += w;
            }
        }
    }

    comm.sum_slice(&mut sums);

    elements
        .into_iter()
        .zip(sums.chunks_exact(3))
        .map(|(element, s)| {
            if s[2] > 0.0 {
                BoundarySample {
                    element,
                    rho: s[0] / s[2],
                    gamma: Some(s[1] / s[2]),
                }
            } else {
                BoundarySample {
                    element,
                    rho: fallback_density,
                    gamma: None,
                }
            }
        })
        .collect()
}

/// The hydrostatic pressure `ρ g · (x − x_c)` integrated over the boundary samples.
pub fn pressure_buoyancy(
    body: &ImmersedBody,
    samples: &[BoundarySample],
    gravity: &Vector<Real>,
) -> Vector<Real> {
    let center = body.position();

    samples.iter().fold(Vector::zeros(), |acc, s| {
        let e = &s.element;
        let p = s.rho * gravity.dot(&(e.point - center));
        acc - e.normal * (p * e.length)
    })
}

/// The pull of the contact lines found along the boundary samples.
///
/// A contact line sits where the phase indicator crosses `0.5` between consecutive samples.
/// There, the interface leaves the wall at `contact_angle`, measured through phase 2, and pulls
/// the body along itself with the tension `sigma`.
pub fn capillary_force(
    body: &ImmersedBody,
    samples: &[BoundarySample],
    sigma: Real,
    contact_angle: Real,
) -> Vector<Real> {
    if sigma == 0.0 {
        return Vector::zeros();
    }

    let n = samples.len();
    let mut force = Vector::zeros();

    for k in 0..n {
        let (a, b) = (&samples[k], &samples[(k + 1) % n]);
        let (ga, gb) = match (a.gamma, b.gamma) {
            (Some(ga), Some(gb)) => (ga, gb),
            _ => continue,
        };

        if (ga < 0.5) == (gb < 0.5) {
            continue;
        }

        let alpha = (0.5 - gb) / (ga - gb);
        let point = b.element.point + (a.element.point - b.element.point) * alpha;
        let normal = body.shape.nearest_edge_unit_normal(&point);
        // Wall tangent pointing into phase 2. The samples run counter-clockwise.
        let tangent = math::perp(&normal) * if gb > ga { 1.0 } else { -1.0 };

        force += (tangent * contact_angle.cos() + normal * contact_angle.sin()) * sigma;
    }

    force
}

/// Every force acting on `body` during the step.
///
/// `fallback_density` is used where no fluid cell lies close to the boundary.
#[allow(clippy::too_many_arguments)]
pub fn body_forces(
    body: &ImmersedBody,
    grid: &FiniteVolumeGrid,
    fields: &FieldRegistry,
    dt: Real,
    gravity: &Vector<Real>,
    surface_tension: &dyn SurfaceTensionModel,
    fallback_density: Real,
    comm: &dyn Communicator,
) -> BodyForces {
    let samples = boundary_samples(body, grid, fields, fallback_density, comm);

    BodyForces {
        hydrodynamic: momentum_exchange(body, grid, fields, dt, comm),
        buoyancy: pressure_buoyancy(body, &samples, gravity),
        capillary: capillary_force(
            body,
            &samples,
            surface_tension.sigma(),
            surface_tension.contact_angle(),
        ),
        weight: gravity * body.mass(),
    }
}

#[cfg(test)]
mod test {
    use super::{body_forces, boundary_samples, capillary_force, pressure_buoyancy};
    use crate::field::FieldRegistry;
    use crate::geometry::{Circle, HGrid, Rectangle, Shape};
    use crate::immersed_boundary::CellClassification;
    use crate::mesh::CartesianGridBuilder;
    use crate::multiphase::ContinuumSurfaceForce;
    use crate::object::{ImmersedBody, ImmersedBodySet};
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    #[test]
    fn uniform_density_gives_archimedes_buoyancy() {
        let g = Vector2::new(0.0, -9.81);
        let shapes = [
            Shape::Circle(Circle::new(Point2::new(0.5, 0.5), 0.2)),
            Shape::Rectangle(Rectangle::new(Point2::new(0.5, 0.5), Vector2::new(0.2, 0.1))),
        ];

        for shape in &shapes {
            let body = ImmersedBody::new(*shape, 1.0);
            let grid = CartesianGridBuilder::new(4, 4, 1.0, 1.0).build();
            let fields = FieldRegistry::new(&grid);
            // No IB cell: every sample takes the fallback density.
            let samples = boundary_samples(&body, &grid, &fields, 998.0, &());
            assert!(samples.iter().all(|s| s.gamma.is_none()));

            let buoyancy = pressure_buoyancy(&body, &samples, &g);
            assert_relative_eq!(buoyancy, -g * (998.0 * shape.area()), max_relative = 1.0e-10);
        }
    }

    #[test]
    fn neutrally_buoyant_body_at_rest_feels_no_net_force() {
        let grid = CartesianGridBuilder::new(20, 20, 1.0, 1.0).build();
        let lookup = HGrid::from_grid(&grid, 0.05);
        let mut bodies = ImmersedBodySet::new();
        let shape = Shape::Circle(Circle::new(Point2::new(0.5, 0.5), 0.17));
        let handle = bodies.insert(ImmersedBody::new(shape, 998.0));
        let _ = CellClassification::classify(&grid, &lookup, 0.05, &mut bodies, &());

        let mut fields = FieldRegistry::new(&grid);
        fields.gamma.fill(1.0);
        fields.rho.fill(998.0);
        fields.rho.save_previous_time_step();
        fields.u.save_previous_time_step();

        let g = Vector2::new(0.0, -9.81);
        let body = &bodies[handle];
        let forces = body_forces(body, &grid, &fields, 1.0e-3, &g, &(), 998.0, &());

        assert_eq!(forces.hydrodynamic, Vector2::zeros());
        assert_eq!(forces.capillary, Vector2::zeros());
        assert_relative_eq!(forces.weight, g * body.mass());
        assert_relative_eq!(forces.net(), Vector2::zeros(), epsilon = 1.0e-8 * body.mass());
    }

    #[test]
    fn contact_lines_follow_the_contact_angle() {
        let grid = CartesianGridBuilder::new(40, 40, 1.0, 1.0).build();
        let lookup = HGrid::from_grid(&grid, 0.025);
        let mut bodies = ImmersedBodySet::new();
        let shape = Shape::Circle(Circle::new(Point2::new(0.5, 0.5), 0.2));
        let handle = bodies.insert(ImmersedBody::new(shape, 500.0));
        let _ = CellClassification::classify(&grid, &lookup, 0.025, &mut bodies, &());

        // Phase 2 below a flat interface through the center.
        let mut fields = FieldRegistry::new(&grid);
        for (i, c) in grid.cells().iter().enumerate() {
            fields.gamma.cells[i] = if c.centroid.y < 0.5 { 1.0 } else { 0.0 };
        }

        let body = &bodies[handle];
        let samples = boundary_samples(body, &grid, &fields, 1.0, &());
        let sigma = 0.07;

        // Normal to the wall, the two contact lines pull in opposite directions.
        let neutral = capillary_force(body, &samples, sigma, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(neutral, Vector2::zeros(), epsilon = 1.0e-3 * sigma);

        // A wetting interface runs down the wall into phase 2 on both sides.
        let wetting = capillary_force(body, &samples, sigma, 0.0);
        assert_relative_eq!(wetting.x, 0.0, epsilon = 1.0e-3 * sigma);
        assert_relative_eq!(wetting.y, -2.0 * sigma, max_relative = 1.0e-2);

        let model = ContinuumSurfaceForce::new(sigma).with_contact_angle(0.0);
        let forces = body_forces(body, &grid, &fields, 1.0e-3, &Vector2::zeros(), &model, 1.0, &());
        assert_relative_eq!(forces.capillary, wetting);
    }
}
