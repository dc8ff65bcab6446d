//! Error types for dynbits.
//!
//! The unchecked `BitArray` operations panic on contract violations. The
//! checked `try_*` variants, parsing, and integer conversion report them through
//! [`BitArrayError`] instead.

use thiserror::Error;

/// The error type for checked `BitArray` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitArrayError {
    /// Index out of bounds
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds {
        /// The index that was accessed
        index: usize,
        /// The valid length
        length: usize,
    },

    /// Operands of a bitwise operation have different sizes
    #[error("Size mismatch: left operand has {left} bits, right operand has {right} bits")]
    SizeMismatch {
        /// Size of the left operand
        left: usize,
        /// Size of the right operand
        right: usize,
    },

    /// Bit pattern contains something other than '0' or '1'
    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter {
        /// Character offset in the input
        position: usize,
        /// The offending character
        character: char,
    },

    /// A set bit does not fit in the target integer
    #[error("Value does not fit in {bits} bits")]
    Overflow {
        /// Width of the target integer
        bits: u32,
    },

    /// Raw storage violates the BitArray layout
    #[error("Invalid storage: {0}")]
    InvalidStorage(String),
}

/// A specialized `Result` type for dynbits operations.
pub type Result<T> = std::result::Result<T, BitArrayError>;
