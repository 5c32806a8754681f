use num_traits::{Signed, Zero};

use crate::calculus::differentiate;
use crate::expr::{Expr, Rational};
use crate::simplify::rules::{add_all, mul_all, neg, pow};
use crate::simplify::{cancel, expand, is_identically_zero, substitute_symbol};

#[derive(Debug, Clone)]
pub enum LinearResult {
    Unique(LinearSolution),
    Infinite(LinearFamily),
    Inconsistent(LinearInconsistent),
    NonLinear(NonLinearResult),
}

#[derive(Debug, Clone)]
pub struct LinearSolution {
    pub variables: Vec<String>,
    pub values: Vec<Expr>,
    pub diagnostics: LinearDiagnostics,
}

impl LinearSolution {
    pub fn pairs(&self) -> Vec<(Expr, Expr)> {
        self.variables
            .iter()
            .cloned()
            .map(Expr::Symbol)
            .zip(self.values.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LinearFamily {
    pub variables: Vec<String>,
    pub particular: Vec<Expr>,
    pub free_variables: Vec<String>,
    pub diagnostics: LinearDiagnostics,
}

#[derive(Debug, Clone)]
pub struct LinearInconsistent {
    pub diagnostics: LinearDiagnostics,
}

#[derive(Debug, Clone)]
pub struct NonLinearResult {
    pub variables: Vec<String>,
    pub nonlinear_equations: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LinearDiagnostics {
    pub rank: usize,
    pub pivot_rows: Vec<usize>,
    pub pivot_columns: Vec<usize>,
    pub free_columns: Vec<usize>,
    pub inconsistent_row: Option<usize>,
    pub normalized_equations: Vec<Expr>,
}

/// Solve `equations[i] = 0` for the symbols in `variables` by exact Gaussian
/// elimination. Coefficients may be arbitrary expressions free of the unknowns.
pub fn solve_linear_system(equations: &[Expr], variables: &[String]) -> LinearResult {
    let n_vars = variables.len();
    let mut nonlinear = Vec::new();
    let mut rows = Vec::with_capacity(equations.len());
    let mut normalized_equations = Vec::with_capacity(equations.len());

    for (idx, eq) in equations.iter().enumerate() {
        let eq = expand(eq);
        match decompose_linear(&eq, variables) {
            Some(mut row) => {
                // Augmented column holds the negated constant term.
                let constant = row.pop().unwrap_or_else(|| Expr::integer(0));
                row.push(neg(constant));
                rows.push(row);
            }
            None => nonlinear.push(idx),
        }
        normalized_equations.push(eq);
    }

    if !nonlinear.is_empty() {
        return LinearResult::NonLinear(NonLinearResult {
            variables: variables.to_vec(),
            nonlinear_equations: nonlinear,
        });
    }

    let mut matrix = Matrix {
        rows: rows.len(),
        cols: n_vars + 1,
        data: rows.into_iter().flatten().collect(),
    };
    let mut diagnostics = LinearDiagnostics {
        normalized_equations,
        ..LinearDiagnostics::default()
    };
    rref(&mut matrix, n_vars, &mut diagnostics);
    diagnostics.free_columns = free_columns(n_vars, &diagnostics.pivot_columns);

    if diagnostics.inconsistent_row.is_some() {
        return LinearResult::Inconsistent(LinearInconsistent { diagnostics });
    }

    let mut values = vec![Expr::integer(0); n_vars];
    for (&row, &col) in diagnostics
        .pivot_rows
        .iter()
        .zip(diagnostics.pivot_columns.iter())
    {
        // Pivot rows are normalized; free columns contribute with their parameter.
        let mut terms = vec![matrix.get(row, n_vars).clone()];
        for &free in &diagnostics.free_columns {
            let coeff = matrix.get(row, free).clone();
            if !coeff.is_zero() {
                terms.push(neg(mul_all(vec![coeff, Expr::symbol(variables[free].clone())])));
            }
        }
        values[col] = cancel(&add_all(terms));
    }

    if diagnostics.rank == n_vars {
        return LinearResult::Unique(LinearSolution {
            variables: variables.to_vec(),
            values,
            diagnostics,
        });
    }

    for &free in &diagnostics.free_columns {
        values[free] = Expr::symbol(variables[free].clone());
    }
    let free_variables = diagnostics
        .free_columns
        .iter()
        .map(|&c| variables[c].clone())
        .collect();
    LinearResult::Infinite(LinearFamily {
        variables: variables.to_vec(),
        particular: values,
        free_variables,
        diagnostics,
    })
}

/// Coefficients of each variable followed by the constant term, or `None`
/// when the expression is not linear in the variables.
fn decompose_linear(expr: &Expr, variables: &[String]) -> Option<Vec<Expr>> {
    let mut row = Vec::with_capacity(variables.len() + 1);
    let mut constant = expr.clone();
    for var in variables {
        let coeff = differentiate(expr, var);
        if variables.iter().any(|v| coeff.has_symbol(v)) {
            return None;
        }
        constant = substitute_symbol(&constant, var, &Expr::integer(0));
        row.push(coeff);
    }
    if variables.iter().any(|v| constant.has_symbol(v)) {
        return None;
    }
    row.push(constant);
    Some(row)
}

fn rref(matrix: &mut Matrix, n_vars: usize, diag: &mut LinearDiagnostics) {
    let rows = matrix.rows;
    if rows == 0 {
        diag.rank = 0;
        return;
    }
    let cols = matrix.cols;
    let mut row = 0;
    for col in 0..n_vars {
        if row >= rows {
            break;
        }

        let Some(pivot_idx) = (row..rows).find(|&r| !is_identically_zero(matrix.get(r, col))) else {
            continue;
        };
        matrix.swap_rows(row, pivot_idx);

        let inverse = pow(matrix.get(row, col).clone(), Expr::integer(-1));
        for c in col..cols {
            let cell = matrix.get(row, c).clone();
            *matrix.get_mut(row, c) = cancel(&mul_all(vec![cell, inverse.clone()]));
        }

        for r in 0..rows {
            if r == row {
                continue;
            }
            let factor = matrix.get(r, col).clone();
            if is_identically_zero(&factor) {
                *matrix.get_mut(r, col) = Expr::integer(0);
                continue;
            }
            for c in col..cols {
                let updated = add_all(vec![
                    matrix.get(r, c).clone(),
                    neg(mul_all(vec![factor.clone(), matrix.get(row, c).clone()])),
                ]);
                *matrix.get_mut(r, c) = cancel(&updated);
            }
        }

        diag.pivot_rows.push(row);
        diag.pivot_columns.push(col);
        row += 1;
    }

    diag.rank = diag.pivot_columns.len();

    for r in row..rows {
        let all_zero = (0..n_vars).all(|c| is_identically_zero(matrix.get(r, c)));
        if all_zero && !is_identically_zero(matrix.get(r, n_vars)) {
            diag.inconsistent_row = Some(r);
            break;
        }
    }
}

fn free_columns(n_vars: usize, pivots: &[usize]) -> Vec<usize> {
    (0..n_vars).filter(|c| !pivots.contains(c)).collect()
}

struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Expr>,
}

impl Matrix {
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn get(&self, row: usize, col: usize) -> &Expr {
        &self.data[self.idx(row, col)]
    }

    fn get_mut(&mut self, row: usize, col: usize) -> &mut Expr {
        let idx = self.idx(row, col);
        &mut self.data[idx]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let cols = self.cols;
        for offset in 0..cols {
            self.data.swap(a * cols + offset, b * cols + offset);
        }
    }
}

/// Determinant by cofactor expansion along the first row.
pub fn determinant(matrix: &[Vec<Expr>]) -> Expr {
    match matrix.len() {
        0 => Expr::integer(1),
        1 => matrix[0][0].clone(),
        n => {
            let mut terms = Vec::with_capacity(n);
            for col in 0..n {
                if matrix[0][col].is_zero() {
                    continue;
                }
                let minor: Vec<Vec<Expr>> = matrix[1..]
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|(c, _)| *c != col)
                            .map(|(_, e)| e.clone())
                            .collect()
                    })
                    .collect();
                let sign = if col % 2 == 0 { 1 } else { -1 };
                terms.push(mul_all(vec![
                    Expr::integer(sign),
                    matrix[0][col].clone(),
                    determinant(&minor),
                ]));
            }
            add_all(terms)
        }
    }
}

/// Dense exact solve of a square rational system `a * x = b`; `None` when singular.
pub fn solve_rational_system(mut a: Vec<Vec<Rational>>, mut b: Vec<Rational>) -> Option<Vec<Rational>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .filter(|&r| !a[r][col].is_zero())
            .max_by(|&x, &y| a[x][col].abs().cmp(&a[y][col].abs()))?;
        a.swap(col, pivot);
        b.swap(col, pivot);
        let p = a[col][col].clone();
        for c in col..n {
            a[col][c] /= p.clone();
        }
        b[col] /= p;
        for r in 0..n {
            if r == col || a[r][col].is_zero() {
                continue;
            }
            let factor = a[r][col].clone();
            for c in col..n {
                let delta = factor.clone() * a[col][c].clone();
                a[r][c] -= delta;
            }
            let delta = factor * b[col].clone();
            b[r] -= delta;
        }
    }
    Some(b)
}
