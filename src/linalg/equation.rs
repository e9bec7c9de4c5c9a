use crate::error::Result;
use crate::linalg::{CsrMatrix, LinearSolver, SolveReport};
use crate::math::{Real, Vector, DIM};

/// A linear system `A x = b` assembled row by row, one row per cell.
#[derive(Clone, Debug)]
pub struct Equation<T> {
    name: &'static str,
    rows: Vec<Vec<(usize, Real)>>,
    rhs: Vec<T>,
}

/// A system with one scalar unknown per cell.
pub type ScalarEquation = Equation<Real>;
/// A system with one vector unknown per cell, solved component by component.
pub type VectorEquation = Equation<Vector<Real>>;

impl<T> Equation<T>
where
    T: Copy + std::ops::AddAssign,
{
    /// An empty system of `n` rows. `zero` is the additive identity of the unknowns.
    pub fn new(name: &'static str, n: usize, zero: T) -> Self {
        Self {
            name,
            rows: vec![Vec::new(); n],
            rhs: vec![zero; n],
        }
    }

    /// The name of this system.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The number of rows.
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Adds `value` to the coefficient `(row, col)`.
    pub fn add(&mut self, row: usize, col: usize, value: Real) {
        let entries = &mut self.rows[row];

        match entries.iter_mut().find(|(c, _)| *c == col) {
            Some(entry) => entry.1 += value,
            None => entries.push((col, value)),
        }
    }

    /// Adds `value` to the right-hand side of `row`.
    pub fn add_source(&mut self, row: usize, value: T) {
        self.rhs[row] += value;
    }

    /// Replaces `row` by the equation `Σ_j coeffs_j x_j = rhs`.
    pub fn set_row(&mut self, row: usize, coeffs: &[(usize, Real)], rhs: T) {
        self.rows[row].clear();

        for (c, v) in coeffs {
            self.add(row, *c, *v);
        }

        self.rhs[row] = rhs;
    }

    /// Replaces `row` by `x_row = value`.
    pub fn fix(&mut self, row: usize, value: T) {
        self.set_row(row, &[(row, 1.0)], value)
    }

    /// The coefficient `(row, col)`, zero if not stored.
    pub fn coefficient(&self, row: usize, col: usize) -> Real {
        self.rows[row]
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    /// The right-hand side of `row`.
    pub fn source(&self, row: usize) -> T {
        self.rhs[row]
    }

    /// The system matrix.
    pub fn matrix(&self) -> CsrMatrix {
        CsrMatrix::from_rows(&self.rows)
    }
}

impl ScalarEquation {
    /// Solves the system, using `x` as the initial guess.
    pub fn solve(&self, solver: &mut dyn LinearSolver, x: &mut [Real]) -> Result<SolveReport> {
        solver.solve(self.name, &self.matrix(), &self.rhs, x)
    }
}

impl VectorEquation {
    /// Solves the system one component at a time, using `x` as the initial guess.
    pub fn solve(
        &self,
        solver: &mut dyn LinearSolver,
        x: &mut [Vector<Real>],
    ) -> Result<SolveReport> {
        let a = self.matrix();
        let mut report = SolveReport::default();

        for k in 0..DIM {
            let b: Vec<Real> = self.rhs.iter().map(|v| v[k]).collect();
            let mut xk: Vec<Real> = x.iter().map(|v| v[k]).collect();
            report = report.merge(solver.solve(self.name, &a, &b, &mut xk)?);

            for (v, xi) in x.iter_mut().zip(xk) {
                v[k] = xi;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::{ScalarEquation, VectorEquation};
    use crate::config::LinearSolverParameters;
    use crate::linalg::BiCgStab;
    use approx::assert_relative_eq;
    use na::Vector2;

    #[test]
    fn assembly_merges_duplicates() {
        let mut eq = ScalarEquation::new("phi", 2, 0.0);
        eq.add(0, 0, 1.0);
        eq.add(0, 0, 2.0);
        eq.add(0, 1, -1.0);
        eq.add_source(0, 1.0);
        assert_eq!(eq.coefficient(0, 0), 3.0);
        assert_eq!(eq.matrix().nnz(), 2);

        eq.fix(0, 5.0);
        assert_eq!(eq.coefficient(0, 1), 0.0);
        assert_eq!(eq.source(0), 5.0);
    }

    #[test]
    fn vector_solve_per_component() {
        let mut eq = VectorEquation::new("u", 2, Vector2::zeros());
        eq.add(0, 0, 2.0);
        eq.add(0, 1, 1.0);
        eq.add(1, 0, 1.0);
        eq.add(1, 1, 3.0);
        eq.add_source(0, Vector2::new(3.0, 1.0));
        eq.add_source(1, Vector2::new(4.0, 2.0));

        let mut solver = BiCgStab::new(LinearSolverParameters::default());
        let mut x = vec![Vector2::zeros(); 2];
        let _ = eq.solve(&mut solver, &mut x).unwrap();

        assert_relative_eq!(x[0], Vector2::new(1.0, 0.2), epsilon = 1.0e-8);
        assert_relative_eq!(x[1], Vector2::new(1.0, 0.6), epsilon = 1.0e-8);
    }
}
