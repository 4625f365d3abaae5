// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::IlaError;

/// Dense row-major cost matrix for one assignment sub-problem.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl CostMatrix {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, IlaError> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| IlaError::invalid_input("cost matrix dimensions overflow"))?;
        if values.len() != expected {
            return Err(IlaError::invalid_input(format!(
                "cost matrix expects {rows}x{cols}={expected} values; got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(IlaError::numerical_issue(format!(
                "cost matrix contains a non-finite entry: {bad}"
            )));
        }
        Ok(Self { values, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// Minimum-cost bipartite assignment (Jonker–Volgenant style shortest
/// augmenting paths with dual potentials, O(n²m)).
///
/// Every row of the smaller side receives a column; the caller filters
/// out gate-cost artifacts afterwards. Returns, per original row, the
/// assigned column index or `None` when rows outnumber columns.
pub fn min_cost_assignment(cost: &CostMatrix) -> Vec<Option<usize>> {
    if cost.rows() == 0 || cost.cols() == 0 {
        return vec![None; cost.rows()];
    }

    if cost.rows() <= cost.cols() {
        solve(cost.rows(), cost.cols(), |r, c| cost.at(r, c))
    } else {
        // Transpose, solve, and invert the column->row assignment.
        let assigned_cols = solve(cost.cols(), cost.rows(), |r, c| cost.at(c, r));
        let mut by_row = vec![None; cost.rows()];
        for (col, row) in assigned_cols.into_iter().enumerate() {
            if let Some(row) = row {
                by_row[row] = Some(col);
            }
        }
        by_row
    }
}

/// Core solver for `n <= m`, 1-indexed internally in the classical
/// formulation. `a(i, j)` reads the cost of row `i`, column `j`
/// (0-indexed).
fn solve(n: usize, m: usize, a: impl Fn(usize, usize) -> f64) -> Vec<Option<usize>> {
    // u, v are the dual potentials; p[j] is the row matched to column j
    // (0 = unmatched); way[j] remembers the augmenting path.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let current = a(i0 - 1, j - 1) - u[i0] - v[j];
                if current < minv[j] {
                    minv[j] = current;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Walk the augmenting path back to the root.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut result = vec![None; n];
    for j in 1..=m {
        if p[j] != 0 {
            result[p[j] - 1] = Some(j - 1);
        }
    }
    result
}
