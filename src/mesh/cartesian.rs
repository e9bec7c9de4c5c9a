use crate::math::{Point, Real, Vector};
use crate::mesh::{BoundaryKind, Cell, CellLink, Face, FiniteVolumeGrid, Patch};

/// Names of the four patches of a Cartesian grid, in construction order.
pub const CARTESIAN_PATCHES: [&str; 4] = ["bottom", "right", "top", "left"];

/// Builder of uniform rectangular grids, single partition.
///
/// Cells are numbered row by row starting from the bottom-left corner. The four sides form the
/// patches `bottom`, `right`, `top` and `left`, all walls unless configured otherwise.
#[derive(Clone, Debug)]
pub struct CartesianGridBuilder {
    nx: usize,
    ny: usize,
    width: Real,
    height: Real,
    origin: Point<Real>,
    kinds: [BoundaryKind; 4],
}

impl CartesianGridBuilder {
    /// A builder for a `width × height` domain split into `nx × ny` cells.
    pub fn new(nx: usize, ny: usize, width: Real, height: Real) -> Self {
        Self {
            nx,
            ny,
            width,
            height,
            origin: Point::origin(),
            kinds: [BoundaryKind::Wall; 4],
        }
    }

    /// Sets the bottom-left corner of the domain.
    pub fn origin(mut self, origin: Point<Real>) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the boundary condition of the patch `name`. Unknown names are ignored.
    pub fn patch_kind(mut self, name: &str, kind: BoundaryKind) -> Self {
        if let Some(i) = CARTESIAN_PATCHES.iter().position(|p| *p == name) {
            self.kinds[i] = kind;
        }
        self
    }

    /// Builds the grid.
    pub fn build(&self) -> FiniteVolumeGrid {
        let (nx, ny) = (self.nx, self.ny);
        let dx = self.width / nx as Real;
        let dy = self.height / ny as Real;
        let id = |i: usize, j: usize| i + j * nx;
        let node = |i: usize, j: usize| self.origin + Vector::new(i as Real * dx, j as Real * dy);

        let mut cells: Vec<Cell> = (0..ny)
            .flat_map(|j| (0..nx).map(move |i| (i, j)))
            .map(|(i, j)| Cell {
                global_id: id(i, j),
                centroid: node(i, j) + Vector::new(dx / 2.0, dy / 2.0),
                volume: dx * dy,
                faces: Vec::with_capacity(4),
                neighbors: Vec::with_capacity(4),
                diagonals: Vec::with_capacity(4),
                is_local: true,
            })
            .collect();
        let mut faces = Vec::new();

        let link = |cells: &mut Vec<Cell>, faces: &mut Vec<Face>, face: Face| {
            let f = faces.len();
            cells[face.owner].faces.push(f);

            if let Some(n) = face.neighbor {
                cells[n].faces.push(f);
                cells[face.owner].neighbors.push(CellLink {
                    cell: n,
                    face: Some(f),
                });
                cells[n].neighbors.push(CellLink {
                    cell: face.owner,
                    face: Some(f),
                });
            }

            faces.push(face);
            f
        };

        for j in 0..ny {
            for i in 0..nx - 1 {
                let nodes = [node(i + 1, j), node(i + 1, j + 1)];
                let _ = link(
                    &mut cells,
                    &mut faces,
                    Face {
                        centroid: na::center(&nodes[0], &nodes[1]),
                        nodes,
                        normal: Vector::new(dy, 0.0),
                        owner: id(i, j),
                        neighbor: Some(id(i + 1, j)),
                        patch: None,
                    },
                );
            }
        }

        for j in 0..ny - 1 {
            for i in 0..nx {
                let nodes = [node(i, j + 1), node(i + 1, j + 1)];
                let _ = link(
                    &mut cells,
                    &mut faces,
                    Face {
                        centroid: na::center(&nodes[0], &nodes[1]),
                        nodes,
                        normal: Vector::new(0.0, dx),
                        owner: id(i, j),
                        neighbor: Some(id(i, j + 1)),
                        patch: None,
                    },
                );
            }
        }

        let sides: [Vec<(usize, [Point<Real>; 2], Vector<Real>)>; 4] = [
            (0..nx)
                .map(|i| (id(i, 0), [node(i, 0), node(i + 1, 0)], Vector::new(0.0, -dx)))
                .collect(),
            (0..ny)
                .map(|j| {
                    let nodes = [node(nx, j), node(nx, j + 1)];
                    (id(nx - 1, j), nodes, Vector::new(dy, 0.0))
                })
                .collect(),
            (0..nx)
                .map(|i| {
                    let nodes = [node(i, ny), node(i + 1, ny)];
                    (id(i, ny - 1), nodes, Vector::new(0.0, dx))
                })
                .collect(),
            (0..ny)
                .map(|j| (id(0, j), [node(0, j), node(0, j + 1)], Vector::new(-dy, 0.0)))
                .collect(),
        ];

        let mut patches = Vec::with_capacity(4);

        for (p, side) in sides.into_iter().enumerate() {
            let patch_faces = side
                .into_iter()
                .map(|(owner, nodes, normal)| {
                    link(
                        &mut cells,
                        &mut faces,
                        Face {
                            centroid: na::center(&nodes[0], &nodes[1]),
                            nodes,
                            normal,
                            owner,
                            neighbor: None,
                            patch: Some(p),
                        },
                    )
                })
                .collect();

            patches.push(Patch {
                name: CARTESIAN_PATCHES[p].to_string(),
                kind: self.kinds[p],
                faces: patch_faces,
            });
        }

        for j in 0..ny {
            for i in 0..nx {
                for (di, dj) in [(-1, -1), (1, -1), (1, 1), (-1, 1)] {
                    let (ni, nj) = (i as isize + di, j as isize + dj);

                    if ni >= 0 && nj >= 0 && (ni as usize) < nx && (nj as usize) < ny {
                        cells[id(i, j)].diagonals.push(CellLink {
                            cell: id(ni as usize, nj as usize),
                            face: None,
                        });
                    }
                }
            }
        }

        FiniteVolumeGrid::new(cells, faces, patches, 0)
    }
}

#[cfg(test)]
mod test {
    use super::CartesianGridBuilder;
    use crate::mesh::BoundaryKind;
    use approx::assert_relative_eq;
    use na::Vector2;

    #[test]
    fn cartesian_topology() {
        let grid = CartesianGridBuilder::new(4, 3, 2.0, 1.5).build();

        assert_eq!(grid.ncells(), 12);
        // 3 * 3 vertical + 4 * 2 horizontal interior faces, 2 * (4 + 3) boundary faces.
        assert_eq!(grid.nfaces(), 9 + 8 + 14);
        assert_eq!(grid.patches().len(), 4);
        assert_eq!(grid.patch("left").unwrap().faces.len(), 3);

        for cell in grid.cells() {
            assert_eq!(cell.faces.len(), 4);
            assert_relative_eq!(cell.volume, 0.25);
        }

        // Interior cell: four face neighbors and four diagonals.
        assert_eq!(grid.cells()[5].neighbors.len(), 4);
        assert_eq!(grid.cells()[5].diagonals.len(), 4);
        // Corner cell.
        assert_eq!(grid.cells()[0].neighbors.len(), 2);
        assert_eq!(grid.cells()[0].diagonals.len(), 1);
    }

    #[test]
    fn cartesian_cells_are_closed() {
        let grid = CartesianGridBuilder::new(3, 3, 1.0, 1.0).build();

        for (i, cell) in grid.cells().iter().enumerate() {
            let sum = cell
                .faces
                .iter()
                .fold(Vector2::zeros(), |acc, f| acc + grid.faces()[*f].outward_normal(i));
            assert_relative_eq!(sum, Vector2::zeros(), epsilon = 1.0e-12);
        }
    }

    #[test]
    fn cartesian_patch_kinds() {
        let grid = CartesianGridBuilder::new(2, 2, 1.0, 1.0)
            .patch_kind("top", BoundaryKind::Outlet)
            .build();

        assert!(grid.has_fixed_pressure());
        let top = grid.patch("top").unwrap();
        for f in &top.faces {
            assert_eq!(grid.boundary_kind(*f), Some(BoundaryKind::Outlet));
            assert!(grid.faces()[*f].normal.y > 0.0);
        }
        assert_relative_eq!(grid.owner_weight(0), 0.5);
    }
}
