use crate::config::LinearSolverParameters;
use crate::error::{Result, SolverError};
use crate::linalg::{CsrMatrix, LinearSolver, SolveReport};
use crate::math::Real;

/// Jacobi-preconditioned BiCGStab.
#[derive(Clone, Debug)]
pub struct BiCgStab {
    params: LinearSolverParameters,
}

impl BiCgStab {
    /// A solver stopping when `|b - Ax| <= max(relative_tolerance |b|, absolute_tolerance)`.
    pub fn new(params: LinearSolverParameters) -> Self {
        Self { params }
    }
}

fn dot(a: &[Real], b: &[Real]) -> Real {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[Real]) -> Real {
    dot(a, a).sqrt()
}

impl LinearSolver for BiCgStab {
    fn solve(
        &mut self,
        system: &str,
        a: &CsrMatrix,
        b: &[Real],
        x: &mut [Real],
    ) -> Result<SolveReport> {
        let n = b.len();
        let inv_diag: Vec<Real> = a
            .diagonal()
            .into_iter()
            .map(|d| if d != 0.0 { 1.0 / d } else { 1.0 })
            .collect();
        let tolerance = (self.params.relative_tolerance * norm(b)).max(self.params.absolute_tolerance);
        let failure = |iterations, residual| SolverError::LinearSolver {
            system: system.to_string(),
            iterations,
            residual,
        };

        let mut r = vec![0.0; n];
        a.mul_to(x, &mut r);
        r.iter_mut().zip(b).for_each(|(ri, bi)| *ri = bi - *ri);

        let mut residual = norm(&r);
        if residual <= tolerance {
            return Ok(SolveReport {
                iterations: 0,
                residual,
            });
        }

        let r_hat = r.clone();
        let (mut rho, mut alpha, mut omega) = (1.0, 1.0, 1.0);
        let mut p = vec![0.0; n];
        let mut v = vec![0.0; n];
        let mut y = vec![0.0; n];
        let mut s = vec![0.0; n];
        let mut z = vec![0.0; n];
        let mut t = vec![0.0; n];

        for iteration in 1..=self.params.max_iterations {
            let rho_new = dot(&r_hat, &r);
            if rho_new == 0.0 || !rho_new.is_finite() {
                return Err(failure(iteration, residual));
            }

            let beta = (rho_new / rho) * (alpha / omega);
            for i in 0..n {
                p[i] = r[i] + beta * (p[i] - omega * v[i]);
                y[i] = inv_diag[i] * p[i];
            }

            a.mul_to(&y, &mut v);
            let r_hat_v = dot(&r_hat, &v);
            if r_hat_v == 0.0 {
                return Err(failure(iteration, residual));
            }
            alpha = rho_new / r_hat_v;

            for i in 0..n {
                x[i] += alpha * y[i];
                s[i] = r[i] - alpha * v[i];
            }

            residual = norm(&s);
            if residual <= tolerance {
                log::trace!("{}: converged in {} iterations", system, iteration);
                return Ok(SolveReport {
                    iterations: iteration,
                    residual,
                });
            }

            for i in 0..n {
                z[i] = inv_diag[i] * s[i];
            }
            a.mul_to(&z, &mut t);
            let tt = dot(&t, &t);
            if tt == 0.0 {
                return Err(failure(iteration, residual));
            }
            omega = dot(&t, &s) / tt;

            for i in 0..n {
                x[i] += omega * z[i];
                r[i] = s[i] - omega * t[i];
            }

            residual = norm(&r);
            if !residual.is_finite() || omega == 0.0 {
                return Err(failure(iteration, residual));
            }

            if residual <= tolerance {
                log::trace!("{}: converged in {} iterations", system, iteration);
                return Ok(SolveReport {
                    iterations: iteration,
                    residual,
                });
            }

            rho = rho_new;
        }

        Err(failure(self.params.max_iterations, residual))
    }
}

#[cfg(test)]
mod test {
    use super::BiCgStab;
    use crate::config::LinearSolverParameters;
    use crate::linalg::{CsrMatrix, LinearSolver};
    use crate::SolverError;
    use approx::assert_relative_eq;

    fn laplacian_1d(n: usize) -> CsrMatrix {
        let rows: Vec<_> = (0..n)
            .map(|i| {
                let mut row = vec![(i, 2.0)];
                if i > 0 {
                    row.push((i - 1, -1.0));
                }
                if i + 1 < n {
                    row.push((i + 1, -1.0));
                }
                row
            })
            .collect();
        CsrMatrix::from_rows(&rows)
    }

    #[test]
    fn solve_laplacian() {
        let n = 20;
        let a = laplacian_1d(n);
        let expected: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut b = vec![0.0; n];
        a.mul_to(&expected, &mut b);

        let mut x = vec![0.0; n];
        let report = BiCgStab::new(LinearSolverParameters::default())
            .solve("laplacian", &a, &b, &mut x)
            .unwrap();

        assert!(report.iterations > 0);
        for (xi, ei) in x.iter().zip(expected.iter()) {
            assert_relative_eq!(*xi, *ei, epsilon = 1.0e-8);
        }
    }

    #[test]
    fn exact_initial_guess_needs_no_iteration() {
        let a = laplacian_1d(3);
        let mut x = vec![1.0, 1.0, 1.0];
        let report = BiCgStab::new(LinearSolverParameters::default())
            .solve("laplacian", &a, &[1.0, 0.0, 1.0], &mut x)
            .unwrap();
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn iteration_limit_is_an_error() {
        let a = laplacian_1d(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let params = LinearSolverParameters {
            max_iterations: 1,
            ..LinearSolverParameters::default()
        };

        match BiCgStab::new(params).solve("laplacian", &a, &b, &mut x) {
            Err(SolverError::LinearSolver { iterations, .. }) => assert_eq!(iterations, 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
