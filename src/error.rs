use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OdeError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no hint matched the equation {0}")]
    NoMatchingHint(String),
    #[error("hint {hint} does not apply to {equation}")]
    HintNotApplicable { hint: String, equation: String },
    #[error(transparent)]
    Unsolvable(#[from] Unsolvable),
    #[error("cannot satisfy initial conditions: {0}")]
    InitialConditions(String),
}

/// Expected failure of a single solving strategy: the equation has the right
/// shape but some algebra step could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot solve: {0}")]
pub struct Unsolvable(pub String);

impl Unsolvable {
    pub fn new(reason: impl Into<String>) -> Self {
        Unsolvable(reason.into())
    }
}
