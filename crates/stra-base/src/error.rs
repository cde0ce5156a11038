//! Error types for stra gemm operations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StraError {
    /// The micro-kernel has no multi-destination (Strassen) operator.
    #[error("kernel {0} has no strassen operator implementation")]
    StraKernelUnimplemented(&'static str),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("view out of bounds: {0}")]
    OutOfBounds(String),

    #[error("invalid thread configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, StraError>;
