//! Symbolic solver for ordinary differential equations, built on a small
//! computer algebra core for parsing, simplifying, differentiating and
//! integrating expressions.

pub mod calculus;
pub mod error;
pub mod expr;
pub mod format;
pub mod ode;
pub mod parser;
pub mod polynomial;
pub mod simplify;
pub mod solver;

pub use calculus::{differentiate, differentiate_n, integrate, try_integrate};
pub use error::{OdeError, Result, Unsolvable};
pub use expr::{Equation, Expr, Func, Rational};
pub use format::pretty;
pub use ode::{
    checkinfsol, checkodesol, classify_ode, constant_renumber, constantsimp, dsolve, dsolve_ode,
    homogeneous_order, infinitesimals, ode_order, ode_sol_simplicity, odesimp, CheckResult,
    Classification, DsolveOptions, Dsolved, Hint, HintRequest, InitialConditions, Ode, Verdict,
    ALL_HINTS,
};
pub use parser::{parse_equation, parse_expr};
pub use simplify::{simplify, substitute};
