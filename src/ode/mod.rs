//! Ordinary differential equations in one unknown function: classification
//! against a catalogue of hints, per-hint solving, post-processing and
//! verification.

pub mod check;
pub mod classify;
pub mod dispatch;
pub mod dsolve;
pub mod hints;
pub mod matcher;
pub mod normalize;
pub mod simp;
pub mod solvers;

pub use check::{checkodesol, CheckResult, Verdict};
pub use classify::{classify_ode, homogeneous_order, Classification};
pub use dispatch::{SolveContext, DEFAULT_SERIES_TERMS};
pub use dsolve::{dsolve, dsolve_ode, AllSolutions, DsolveOptions, Dsolved, HintRequest};
pub use hints::{Hint, ALL_HINTS};
pub use matcher::{match_pattern, power_coefficients, MatchRecord, Wild};
pub use normalize::{ode_order, parse_condition, Condition, InitialConditions, Ode};
pub use simp::{constant_renumber, constantsimp, evaluate_integrals, ode_sol_simplicity, odesimp, Simplicity};
pub use solvers::is_constant_name;
pub use solvers::lie::{checkinfsol, infinitesimals, Heuristic, Infinitesimal};
