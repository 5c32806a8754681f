//! Calculus routines (differentiation and integration).

pub mod differentiate;
pub mod integrate;

pub use differentiate::{differentiate, differentiate_n};
pub use integrate::{
    integrate, integrate_report, try_integrate, AttemptStatus, IntegrationAttempt,
    IntegrationResult, Strategy,
};
