use serde::{Deserialize, Serialize};

use crate::math::{Point, Real, Vector};

/// A disk.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct Circle {
    /// Center of the disk.
    pub center: Point<Real>,
    /// Radius of the disk.
    pub radius: Real,
}

/// An axis-aligned rectangle.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct Rectangle {
    /// Center of the rectangle.
    pub center: Point<Real>,
    /// Half the width and half the height.
    pub half_extents: Vector<Real>,
}

/// A piece of a shape boundary.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundaryElement {
    /// Midpoint of the element.
    pub point: Point<Real>,
    /// Outward unit normal.
    pub normal: Vector<Real>,
    /// Length of the element.
    pub length: Real,
}

/// The geometry of an immersed body, in world space.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    /// A disk.
    Circle(Circle),
    /// An axis-aligned rectangle.
    Rectangle(Rectangle),
}

impl Circle {
    /// A disk of the given center and radius.
    pub fn new(center: Point<Real>, radius: Real) -> Self {
        Self { center, radius }
    }
}

impl Rectangle {
    /// A rectangle of the given center and half extents.
    pub fn new(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    // Index (0 = x, 1 = y) and side (+1/-1) of the edge closest to an interior point.
    fn closest_edge(&self, point: &Point<Real>) -> (usize, Real) {
        let local = point - self.center;
        let gaps = self.half_extents - local.abs();
        let axis = if gaps.x <= gaps.y { 0 } else { 1 };
        let side = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
        (axis, side)
    }
}

impl Shape {
    /// A short name of the shape variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Circle(_) => "circle",
            Shape::Rectangle(_) => "rectangle",
        }
    }

    /// The center of mass.
    pub fn centroid(&self) -> Point<Real> {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Rectangle(r) => r.center,
        }
    }

    /// The area enclosed by the shape.
    pub fn area(&self) -> Real {
        match self {
            Shape::Circle(c) => std::f64::consts::PI * c.radius * c.radius,
            Shape::Rectangle(r) => 4.0 * r.half_extents.x * r.half_extents.y,
        }
    }

    /// Moves the shape by `displacement`.
    pub fn translate(&mut self, displacement: &Vector<Real>) {
        match self {
            Shape::Circle(c) => c.center += *displacement,
            Shape::Rectangle(r) => r.center += *displacement,
        }
    }

    /// Whether `point` lies strictly inside the shape.
    pub fn contains(&self, point: &Point<Real>) -> bool {
        match self {
            Shape::Circle(c) => (point - c.center).norm_squared() < c.radius * c.radius,
            Shape::Rectangle(r) => {
                let local = point - r.center;
                local.x.abs() < r.half_extents.x && local.y.abs() < r.half_extents.y
            }
        }
    }

    /// The point of the shape boundary closest to `point`.
    pub fn nearest_intersect(&self, point: &Point<Real>) -> Point<Real> {
        match self {
            Shape::Circle(c) => c.center + self.nearest_edge_unit_normal(point) * c.radius,
            Shape::Rectangle(r) => {
                let local = point - r.center;

                if self.contains(point) {
                    let (axis, side) = r.closest_edge(point);
                    let mut projected = local;
                    projected[axis] = side * r.half_extents[axis];
                    r.center + projected
                } else {
                    r.center + local.zip_map(&r.half_extents, |l, h| na::clamp(l, -h, h))
                }
            }
        }
    }

    /// The outward unit normal of the boundary at the point closest to `point`.
    pub fn nearest_edge_unit_normal(&self, point: &Point<Real>) -> Vector<Real> {
        match self {
            Shape::Circle(c) => {
                let dir = point - c.center;
                let norm = dir.norm();

                if norm > 0.0 {
                    dir / norm
                } else {
                    Vector::x()
                }
            }
            Shape::Rectangle(r) => {
                if self.contains(point) {
                    let (axis, side) = r.closest_edge(point);
                    let mut n = Vector::zeros();
                    n[axis] = side;
                    n
                } else {
                    let dir = point - self.nearest_intersect(point);
                    let norm = dir.norm();

                    if norm > 0.0 {
                        dir / norm
                    } else {
                        let (axis, side) = r.closest_edge(point);
                        let mut n = Vector::zeros();
                        n[axis] = side;
                        n
                    }
                }
            }
        }
    }

    /// The distance from `point` to the shape boundary.
    pub fn distance_to_boundary(&self, point: &Point<Real>) -> Real {
        (point - self.nearest_intersect(point)).norm()
    }

    /// Splits the boundary into about `n` elements, counter-clockwise.
    ///
    /// A circle gets `n` arcs of equal angle. Each side of a rectangle gets `n / 4` segments.
    pub fn boundary_elements(&self, n: usize) -> Vec<BoundaryElement> {
        match self {
            Shape::Circle(c) => {
                let n = n.max(3);
                let dtheta = 2.0 * std::f64::consts::PI / n as Real;

                (0..n)
                    .map(|k| {
                        let theta = (k as Real + 0.5) * dtheta;
                        let normal = Vector::new(theta.cos(), theta.sin());
                        BoundaryElement {
                            point: c.center + normal * c.radius,
                            normal,
                            length: c.radius * dtheta,
                        }
                    })
                    .collect()
            }
            Shape::Rectangle(r) => {
                let per_side = (n / 4).max(1);
                let h = r.half_extents;
                // Start corner and outward normal of each side.
                let sides = [
                    (Vector::new(-h.x, -h.y), Vector::new(0.0, -1.0)),
                    (Vector::new(h.x, -h.y), Vector::new(1.0, 0.0)),
                    (Vector::new(h.x, h.y), Vector::new(0.0, 1.0)),
                    (Vector::new(-h.x, h.y), Vector::new(-1.0, 0.0)),
                ];

                sides
                    .iter()
                    .flat_map(|(start, normal)| {
                        // Counter-clockwise direction along the side.
                        let dir = Vector::new(-normal.y, normal.x);
                        let side_length = 2.0 * h.dot(&dir.abs());
                        let length = side_length / per_side as Real;

                        (0..per_side).map(move |k| BoundaryElement {
                            point: r.center + *start + dir * (length * (k as Real + 0.5)),
                            normal: *normal,
                            length,
                        })
                    })
                    .collect()
            }
        }
    }

    /// The axis-aligned bounding box of the shape, as `(mins, maxs)`.
    pub fn aabb(&self) -> (Point<Real>, Point<Real>) {
        let half = match self {
            Shape::Circle(c) => Vector::repeat(c.radius),
            Shape::Rectangle(r) => r.half_extents,
        };
        let center = self.centroid();
        (center - half, center + half)
    }
}

#[cfg(test)]
mod test {
    use super::{Circle, Rectangle, Shape};
    use crate::math::Real;
    use approx::assert_relative_eq;
    use na::{Point2, Vector2};

    #[test]
    fn circle_queries() {
        let shape = Shape::Circle(Circle::new(Point2::new(1.0, 1.0), 0.5));

        assert!(shape.contains(&Point2::new(1.2, 1.1)));
        assert!(!shape.contains(&Point2::new(1.5, 1.0)));
        assert_relative_eq!(
            shape.nearest_intersect(&Point2::new(3.0, 1.0)),
            Point2::new(1.5, 1.0)
        );
        assert_relative_eq!(
            shape.nearest_edge_unit_normal(&Point2::new(1.0, 0.9)),
            Vector2::new(0.0, -1.0)
        );
        assert_relative_eq!(shape.distance_to_boundary(&Point2::new(1.0, 2.0)), 0.5);
        // The center has no preferred direction but still gets a boundary point.
        assert_relative_eq!(shape.distance_to_boundary(&Point2::new(1.0, 1.0)), 0.5);
    }

    #[test]
    fn rectangle_queries() {
        let shape = Shape::Rectangle(Rectangle::new(Point2::origin(), Vector2::new(2.0, 1.0)));

        assert_relative_eq!(shape.area(), 8.0);
        assert_relative_eq!(
            shape.nearest_intersect(&Point2::new(0.5, 0.8)),
            Point2::new(0.5, 1.0)
        );
        assert_relative_eq!(
            shape.nearest_intersect(&Point2::new(3.0, 3.0)),
            Point2::new(2.0, 1.0)
        );
        assert_relative_eq!(
            shape.nearest_edge_unit_normal(&Point2::new(-1.9, 0.0)),
            Vector2::new(-1.0, 0.0)
        );

        let (mins, maxs) = shape.aabb();
        assert_relative_eq!(mins, Point2::new(-2.0, -1.0));
        assert_relative_eq!(maxs, Point2::new(2.0, 1.0));
    }

    #[test]
    fn boundary_elements_close_the_shape() {
        let shapes = [
            Shape::Circle(Circle::new(Point2::new(0.3, -0.2), 0.7)),
            Shape::Rectangle(Rectangle::new(Point2::new(1.0, 2.0), Vector2::new(0.5, 0.25))),
        ];

        for shape in &shapes {
            let elements = shape.boundary_elements(40);
            let center = shape.centroid();

            // ∮ n ds = 0 and ∮ (x − c) · n ds = 2 A.
            let closure = elements
                .iter()
                .fold(Vector2::zeros(), |acc, e| acc + e.normal * e.length);
            let flux: Real = elements
                .iter()
                .map(|e| (e.point - center).dot(&e.normal) * e.length)
                .sum();

            assert_relative_eq!(closure, Vector2::zeros(), epsilon = 1.0e-12);
            assert_relative_eq!(flux, 2.0 * shape.area(), max_relative = 1.0e-12);

            for e in &elements {
                assert_relative_eq!(shape.distance_to_boundary(&e.point), 0.0, epsilon = 1.0e-12);
            }
        }

        assert_eq!(shapes[1].boundary_elements(40).len(), 40);
    }
}
