use std::fmt;

/// Exceptional outcomes of a solve; "no solution found" is an empty set, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// the cancellation token was triggered
    Cancelled,
    /// recursion went deeper than the configured ceiling
    RecursionLimit(usize),
    /// a broken internal precondition
    Internal(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveError::Cancelled => write!(f, "Solve was cancelled"),
            SolveError::RecursionLimit(depth) => {
                write!(f, "Recursion limit of {} nested solves exceeded", depth)
            }
            SolveError::Internal(msg) => write!(f, "Internal solver error: {}", msg),
        }
    }
}

impl std::error::Error for SolveError {}

pub type SolveResult<T> = Result<T, SolveError>;
