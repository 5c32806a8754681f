//! Algebraic equation solving: exact linear systems and single-unknown inversion.

mod invert;
mod linear;

pub use invert::solve_for;
pub use linear::{
    determinant, solve_linear_system, solve_rational_system, LinearDiagnostics, LinearFamily,
    LinearInconsistent, LinearResult, LinearSolution, NonLinearResult,
};
