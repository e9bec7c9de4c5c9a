use crate::math::Real;

/// A square sparse matrix in compressed sparse row format.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    row_offsets: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<Real>,
}

impl CsrMatrix {
    /// Builds a matrix from its rows, each given as `(column, value)` pairs.
    pub fn from_rows(rows: &[Vec<(usize, Real)>]) -> Self {
        let nnz = rows.iter().map(|r| r.len()).sum();
        let mut row_offsets = Vec::with_capacity(rows.len() + 1);
        let mut cols = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_offsets.push(0);

        for row in rows {
            for (c, v) in row {
                cols.push(*c);
                values.push(*v);
            }
            row_offsets.push(cols.len());
        }

        Self {
            row_offsets,
            cols,
            values,
        }
    }

    /// The number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// The number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// The stored entries of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, Real)> + '_ {
        let range = self.row_offsets[i]..self.row_offsets[i + 1];
        self.cols[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// The diagonal entries.
    pub fn diagonal(&self) -> Vec<Real> {
        (0..self.nrows())
            .map(|i| {
                self.row(i)
                    .filter(|(c, _)| *c == i)
                    .map(|(_, v)| v)
                    .sum()
            })
            .collect()
    }

    /// Computes `out = self * x`.
    pub fn mul_to(&self, x: &[Real], out: &mut [Real]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.row(i).map(|(c, v)| v * x[c]).sum();
        }
    }
}
