//! Formatting helpers for rendering expressions and equations.

pub mod expr;

pub use expr::pretty;
