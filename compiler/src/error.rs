use thiserror::Error;

#[derive(Debug, Error)]
pub enum TbsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Verifier error: {0}")]
    VerifierError(String),

    #[error("Cyclic model reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    #[error("Layout error: {0}")]
    LayoutError(String),
}
