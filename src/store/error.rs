use thiserror::Error;

/// Why the store refused a transition. Messages are safe to show to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query {read} failed: {message}")]
    Query { read: &'static str, message: String },

    #[error("procedure {name}({params}) failed: {message}")]
    Procedure {
        name: String,
        params: String,
        message: String,
    },

    #[error("function {name}({params}) failed: {message}")]
    Function {
        name: String,
        params: String,
        message: String,
    },

    #[error("procedure {name}({params}) rejected: {rejection}")]
    Rejected {
        name: String,
        params: String,
        rejection: Rejection,
    },
}

impl StoreError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            StoreError::Rejected { rejection, .. } => Some(rejection),
            _ => None,
        }
    }
}
