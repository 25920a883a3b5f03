//! Error types for fixed-point arithmetic and identifier validation.

use thiserror::Error;

/// Errors raised validating a typed ID or address wrapper.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("id cannot be null/zero")]
    NullId,

    #[error("id value {value} exceeds maximum allowed value {max}")]
    ValueTooLarge { value: u64, max: u64 },

    #[error("id value {value} is below minimum allowed value {min}")]
    ValueTooSmall { value: u64, min: u64 },

    #[error("invalid hex address: {0}")]
    InvalidHex(String),

    #[error("invalid base58 address: {0}")]
    InvalidBase58(String),

    #[error("validation failed: {message}")]
    Custom { message: String },
}

/// Errors raised by fixed-point arithmetic in [`crate::fixed_point`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixedPointError {
    #[error("overflow: value {value} exceeds the representable range")]
    Overflow { value: String },

    #[error("underflow: value {value} is below the representable range")]
    Underflow { value: String },

    #[error("invalid decimal string: '{input}'")]
    InvalidDecimal { input: String },

    #[error("division by zero in fixed-point arithmetic")]
    DivisionByZero,

    #[error("value is not finite: {value}")]
    NotFinite { value: f64 },

    #[error("basis points value {0} exceeds 10000 (100%)")]
    BpsOutOfRange(u32),
}
