use serde::{Deserialize, Serialize};

use crate::math::{Point, Real, Vector};

/// The kind of condition applied on a boundary patch.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum BoundaryKind {
    /// No-slip wall with zero normal pressure gradient.
    Wall,
    /// Fixed velocity and phase indicator, zero normal pressure gradient.
    Inlet {
        /// Imposed velocity.
        velocity: Vector<Real>,
        /// Imposed phase indicator.
        gamma: Real,
    },
    /// Zero-gradient velocity and phase indicator, fixed zero pressure.
    Outlet,
}

impl BoundaryKind {
    /// Whether the pressure is fixed on this kind of patch.
    pub fn fixes_pressure(&self) -> bool {
        matches!(self, BoundaryKind::Outlet)
    }
}

/// A named set of boundary faces sharing one boundary condition.
#[derive(Clone, Debug)]
pub struct Patch {
    /// Name of the patch.
    pub name: String,
    /// Boundary condition of the patch.
    pub kind: BoundaryKind,
    /// Indices of the faces of this patch.
    pub faces: Vec<usize>,
}

/// A link from a cell to one of its neighbors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellLink {
    /// The neighbor cell.
    pub cell: usize,
    /// The face shared with the neighbor, `None` for diagonal (vertex) links.
    pub face: Option<usize>,
}

/// A control volume.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Global identifier of this cell, unique across all partitions.
    pub global_id: usize,
    /// Center of mass.
    pub centroid: Point<Real>,
    /// Area of the cell.
    pub volume: Real,
    /// Faces enclosing this cell.
    pub faces: Vec<usize>,
    /// Face-adjacent neighbors.
    pub neighbors: Vec<CellLink>,
    /// Neighbors sharing only a vertex with this cell.
    pub diagonals: Vec<CellLink>,
    /// Whether this cell is owned by the local partition. Ghost cells are read-only copies of
    /// cells owned by another partition.
    pub is_local: bool,
}

impl Cell {
    /// All the neighbor links of this cell: face-adjacent first, then diagonal.
    pub fn links(&self) -> impl Iterator<Item = &CellLink> {
        self.neighbors.iter().chain(self.diagonals.iter())
    }
}

/// A face between two cells, or between a cell and the domain boundary.
#[derive(Clone, Debug)]
pub struct Face {
    /// Center of the face.
    pub centroid: Point<Real>,
    /// End points of the face.
    pub nodes: [Point<Real>; 2],
    /// Area-weighted normal, pointing from `owner` toward `neighbor` (or outward on the
    /// boundary).
    pub normal: Vector<Real>,
    /// The cell on the back side of the normal.
    pub owner: usize,
    /// The cell on the front side of the normal, `None` on the domain boundary.
    pub neighbor: Option<usize>,
    /// The patch this face belongs to, for boundary faces.
    pub patch: Option<usize>,
}

impl Face {
    /// The area of this face.
    #[inline]
    pub fn area(&self) -> Real {
        self.normal.norm()
    }

    /// The unit normal of this face.
    #[inline]
    pub fn unit_normal(&self) -> Vector<Real> {
        self.normal / self.area()
    }

    /// Whether this face lies on the domain boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.neighbor.is_none()
    }

    /// The normal oriented outward from `cell`.
    #[inline]
    pub fn outward_normal(&self, cell: usize) -> Vector<Real> {
        if self.owner == cell {
            self.normal
        } else {
            -self.normal
        }
    }

    /// The cell on the other side of this face, seen from `cell`.
    #[inline]
    pub fn other(&self, cell: usize) -> Option<usize> {
        if self.owner == cell {
            self.neighbor
        } else {
            Some(self.owner)
        }
    }

    /// The closest point of this face to `point`.
    pub fn closest_point(&self, point: &Point<Real>) -> Point<Real> {
        let [a, b] = self.nodes;
        let ab = b - a;
        let t = (point - a).dot(&ab) / ab.norm_squared();
        a + ab * na::clamp(t, 0.0, 1.0)
    }
}

/// The finite-volume grid of one partition.
#[derive(Clone, Debug)]
pub struct FiniteVolumeGrid {
    cells: Vec<Cell>,
    faces: Vec<Face>,
    patches: Vec<Patch>,
    partition: usize,
}

impl FiniteVolumeGrid {
    /// Assembles a grid from its cells, faces and patches.
    ///
    /// `partition` is the rank of the partition owning the local cells.
    pub fn new(cells: Vec<Cell>, faces: Vec<Face>, patches: Vec<Patch>, partition: usize) -> Self {
        Self {
            cells,
            faces,
            patches,
            partition,
        }
    }

    /// All the cells, local and ghost.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All the faces.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// All the boundary patches.
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// The patch named `name`.
    pub fn patch(&self, name: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.name == name)
    }

    /// The rank of the partition owning the local cells.
    #[inline]
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// The number of cells, local and ghost.
    #[inline]
    pub fn ncells(&self) -> usize {
        self.cells.len()
    }

    /// The number of faces.
    #[inline]
    pub fn nfaces(&self) -> usize {
        self.faces.len()
    }

    /// Indices of the cells owned by this partition.
    pub fn local_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_local)
            .map(|(i, _)| i)
    }

    /// Whether `cell` is owned by this partition.
    #[inline]
    pub fn is_local(&self, cell: usize) -> bool {
        self.cells[cell].is_local
    }

    /// The boundary kind of a boundary face, `None` for interior faces.
    pub fn boundary_kind(&self, face: usize) -> Option<BoundaryKind> {
        self.faces[face].patch.map(|p| self.patches[p].kind)
    }

    /// Linear interpolation weight of the owner cell at `face`.
    ///
    /// Returns `1` on boundary faces.
    pub fn owner_weight(&self, face: usize) -> Real {
        let f = &self.faces[face];

        match f.neighbor {
            Some(n) => {
                let n_hat = f.unit_normal();
                let dp = (f.centroid - self.cells[f.owner].centroid).dot(&n_hat).abs();
                let dn = (self.cells[n].centroid - f.centroid).dot(&n_hat).abs();
                dn / (dp + dn)
            }
            None => 1.0,
        }
    }

    /// The vector joining the owner centroid to the neighbor centroid, or to the face centroid
    /// on the boundary.
    pub fn face_delta(&self, face: usize) -> Vector<Real> {
        let f = &self.faces[face];
        let owner = &self.cells[f.owner].centroid;

        match f.neighbor {
            Some(n) => self.cells[n].centroid - owner,
            None => f.centroid - owner,
        }
    }

    /// Linear interpolation of cell values at `face`. Boundary faces take `boundary`.
    #[inline]
    pub fn interpolate<T>(&self, face: usize, cells: &[T], boundary: T) -> T
    where
        T: Copy + std::ops::Mul<Real, Output = T> + std::ops::Add<Output = T>,
    {
        let f = &self.faces[face];

        match f.neighbor {
            Some(n) => {
                let g = self.owner_weight(face);
                cells[f.owner] * g + cells[n] * (1.0 - g)
            }
            None => boundary,
        }
    }

    /// Whether any patch of this partition fixes the pressure.
    pub fn has_fixed_pressure(&self) -> bool {
        self.patches.iter().any(|p| p.kind.fixes_pressure())
    }
}
