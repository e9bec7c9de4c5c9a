use fnv::FnvHasher;
use std::collections::HashMap;

use crate::math::{Point, Real, DIM};
use crate::mesh::FiniteVolumeGrid;

use std::hash::BuildHasher;

/// Fixed-key FNV hashing, so that iteration orders do not change between runs.
#[derive(Copy, Clone, Debug)]
pub struct DeterministicState;

impl BuildHasher for DeterministicState {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::with_key(1820)
    }
}

/// A mesh element stored in a [`HGrid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HGridEntry {
    /// A cell, inserted at its centroid.
    Cell(usize),
    /// A boundary face, inserted at its centroid.
    BoundaryFace(usize),
}

/// A grid based on spacial hashing.
#[derive(PartialEq, Debug, Clone)]
pub struct HGrid<T> {
    cells: HashMap<Point<i64>, Vec<T>, DeterministicState>,
    cell_width: Real,
}

impl<T> HGrid<T> {
    /// Initialize a grid where each cell has the width `cell_width`.
    pub fn new(cell_width: Real) -> Self {
        Self {
            cells: HashMap::with_hasher(DeterministicState),
            cell_width,
        }
    }

    /// The width of the cells of this grid.
    pub fn cell_width(&self) -> Real {
        self.cell_width
    }

    fn quantify(value: Real, cell_width: Real) -> i64 {
        (value / cell_width).floor() as i64
    }

    /// The key of the cell containing `point`.
    pub fn key(&self, point: &Point<Real>) -> Point<i64> {
        Point::from(point.coords.map(|e| Self::quantify(e, self.cell_width)))
    }

    /// Removes all elements from this grid.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Inserts the given `element` into the cell containing the given `point`.
    pub fn insert(&mut self, point: &Point<Real>, element: T) {
        let key = self.key(point);
        self.cells.entry(key).or_insert(Vec::new()).push(element)
    }

    /// Returns the element attached to the cell containing the given `point`.
    ///
    /// Returns `None` if the cell is empty.
    pub fn cell_containing_point(&self, point: &Point<Real>) -> Option<&Vec<T>> {
        let key = self.key(point);
        self.cells.get(&key)
    }

    /// An iterator through all the cells intersecting the given AABB.
    pub fn cells_intersecting_aabb(
        &self,
        mins: &Point<Real>,
        maxs: &Point<Real>,
    ) -> impl Iterator<Item = (Point<i64>, &Vec<T>)> {
        let cells = &self.cells;
        let start = self.key(mins);
        let end = self.key(maxs);

        CellRangeIterator::new(start, end)
            .filter_map(move |cell| cells.get(&cell).map(|c| (cell, c)))
    }

    /// An iterator through all the elements stored in the cells intersecting the given AABB.
    pub fn elements_intersecting_aabb(
        &self,
        mins: &Point<Real>,
        maxs: &Point<Real>,
    ) -> impl Iterator<Item = &T> {
        self.cells_intersecting_aabb(mins, maxs)
            .flat_map(|(_, elements)| elements.iter())
    }
}

impl HGrid<HGridEntry> {
    /// A lookup of the cells and boundary faces of `grid`.
    ///
    /// Elements are inserted at their centroid: queries must enlarge their AABB by the largest
    /// cell size to catch every element touching it.
    pub fn from_grid(grid: &FiniteVolumeGrid, cell_width: Real) -> Self {
        let mut hgrid = Self::new(cell_width);

        for (i, cell) in grid.cells().iter().enumerate() {
            hgrid.insert(&cell.centroid, HGridEntry::Cell(i));
        }

        for (i, face) in grid.faces().iter().enumerate() {
            if face.is_boundary() {
                hgrid.insert(&face.centroid, HGridEntry::BoundaryFace(i));
            }
        }

        hgrid
    }
}

struct CellRangeIterator {
    start: Point<i64>,
    end: Point<i64>,
    curr: Point<i64>,
    done: bool,
}

impl CellRangeIterator {
    fn new(start: Point<i64>, end: Point<i64>) -> Self {
        Self {
            start,
            end,
            curr: start,
            done: false,
        }
    }

    #[cfg(test)]
    fn with_center(center: Point<i64>, radius: i64) -> Self {
        let start = center - na::Vector2::repeat(radius);
        Self {
            start,
            end: center + na::Vector2::repeat(radius),
            curr: start,
            done: false,
        }
    }
}

impl Iterator for CellRangeIterator {
    type Item = Point<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.curr == self.end {
            self.done = true;
            Some(self.curr)
        } else {
            let result = self.curr;

            for i in 0..DIM {
                self.curr[i] += 1;

                if self.curr[i] > self.end[i] {
                    self.curr[i] = self.start[i];
                } else {
                    break;
                }
            }

            Some(result)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CellRangeIterator, HGrid, HGridEntry};
    use crate::mesh::CartesianGridBuilder;
    use na::Point2;

    #[test]
    fn grid_neighbor_iterator() {
        let expected: Vec<_> = (0..=4)
            .flat_map(|y| (-1..=3).map(move |x| Point2::new(x, y)))
            .collect();

        let iter = CellRangeIterator::with_center(Point2::new(1, 2), 2);
        let visited: Vec<_> = iter.take(expected.len()).collect();

        assert_eq!(visited, expected);
    }

    #[test]
    fn aabb_query_finds_cells_and_walls() {
        let grid = CartesianGridBuilder::new(10, 10, 1.0, 1.0).build();
        let hgrid = HGrid::from_grid(&grid, 0.1);

        let mut cells: Vec<usize> = hgrid
            .elements_intersecting_aabb(&Point2::new(0.01, 0.01), &Point2::new(0.19, 0.19))
            .filter_map(|e| match e {
                HGridEntry::Cell(i) => Some(*i),
                HGridEntry::BoundaryFace(_) => None,
            })
            .collect();
        cells.sort();
        assert_eq!(cells, vec![0, 1, 10, 11]);

        let walls = hgrid
            .elements_intersecting_aabb(&Point2::new(-0.01, 0.32), &Point2::new(0.01, 0.38))
            .filter(|e| matches!(e, HGridEntry::BoundaryFace(_)))
            .count();
        assert_eq!(walls, 1);
    }
}
