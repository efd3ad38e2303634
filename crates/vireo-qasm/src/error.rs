//! Error types for the assembly-format parser.

use thiserror::Error;

/// Errors that can occur while parsing circuit text or JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at byte {position}: unrecognized input")]
    LexerError {
        /// Byte offset of the bad input.
        position: usize,
    },

    /// Unexpected token.
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// What it found instead.
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Missing or unsupported version header.
    #[error("Missing or unsupported version header: {0}")]
    InvalidVersion(String),

    /// A gate name the gate library does not recognize.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// Wrong number of qubit operands for a gate.
    #[error("Gate '{gate}' expects {expected} qubits, got {got}")]
    WrongQubitCount {
        /// Gate name.
        gate: String,
        /// Expected operand count.
        expected: usize,
        /// Provided operand count.
        got: usize,
    },

    /// Wrong number of parameters for a gate.
    #[error("Gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        /// Gate name.
        gate: String,
        /// Expected parameter count.
        expected: usize,
        /// Provided parameter count.
        got: usize,
    },

    /// Register index out of bounds.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        /// Register name.
        register: String,
        /// Offending index.
        index: u32,
        /// Register size.
        size: u32,
    },

    /// Reference to an undeclared register.
    #[error("Undeclared register: {0}")]
    UndeclaredRegister(String),

    /// Duplicate register declaration.
    #[error("Duplicate register declaration: {0}")]
    DuplicateRegister(String),

    /// Register broadcast with mismatched sizes.
    #[error("Cannot broadcast over registers of different sizes ({0} vs {1})")]
    BroadcastMismatch(u32, u32),

    /// Malformed JSON input.
    #[error("Invalid JSON circuit: {0}")]
    InvalidJson(String),

    /// IR error during circuit construction.
    #[error("Circuit error: {0}")]
    Circuit(#[from] vireo_ir::IrError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
