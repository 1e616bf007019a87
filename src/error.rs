use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Command '{0}' timed out")]
    Timeout(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Engine error {code}: {message}")]
    Engine { code: i32, message: String },

    #[error("Evaluation failed: {0}")]
    Eval(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Breakpoint not found: {0}")]
    BreakpointNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::SessionNotFound(_) => -32001,
            Error::BreakpointNotFound(_) => -32002,
            Error::Engine { .. } | Error::Eval(_) => -32003,
            Error::Protocol(_) | Error::Xml(_) => -32004,
            Error::Timeout(_) => -32005,
            Error::ConnectionClosed => -32006,
            Error::InvalidRequest(_) => -32600,
            Error::MethodNotFound(_) => -32601,
            Error::Io(_) | Error::Json(_) | Error::Internal(_) => -32603,
        }
    }
}
