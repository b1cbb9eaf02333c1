use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VdkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("parser error: {0}")]
    Parser(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),

    /// A marker, reserved field or checksum did not hold.
    #[error("malformed {context}: {reason}")]
    MalformedHeader { context: String, reason: String },

    /// A declared size runs past the bytes that are actually there.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: u64, available: u64 },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl VdkError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        VdkError::MalformedHeader {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(needed: u64, available: u64) -> Self {
        VdkError::TruncatedInput { needed, available }
    }
}

pub type Result<T> = std::result::Result<T, VdkError>;
