//! dynbits - Dynamic Bit Array
//!
//! `dynbits` provides [`BitArray`], a resizable sequence of bits packed into
//! 32-bit words. It behaves like a plain value: clones are deep copies, and
//! equality compares size and bit pattern.
//!
//! # Key Characteristics
//!
//! - Word-level storage with hardware popcount for counting
//! - Logical shifts and in-place bitwise operators over a fixed-size window
//! - String form with the highest index first, parseable back with `FromStr`
//! - Panicking operators plus checked `try_*` variants returning [`Result`]
//!
//! # Examples
//!
//! ```
//! use dynbits::BitArray;
//!
//! let mut a = BitArray::with_value(8, 0b1010_1010);
//! let b = BitArray::with_value(8, 0b1100_1100);
//!
//! a &= &b;
//! assert_eq!(a.to_string(), "10001000");
//!
//! a |= &b;
//! assert_eq!(a.to_string(), "11001100");
//!
//! a ^= &b;
//! assert!(a.none());
//! ```
//!
//! ## Resizing
//!
//! ```
//! use dynbits::BitArray;
//!
//! let mut ba = BitArray::new(5);
//! ba.resize(10, true);
//! assert_eq!(ba.size(), 10);
//! assert!(ba[9]);
//!
//! ba.resize(3, false);
//! assert_eq!(ba.size(), 3);
//! ```
//!
//! # Features
//!
//! - `serde` (default): `Serialize`/`Deserialize` for `BitArray`. Deserialization
//!   rejects storage that does not match the declared size.
//!
//! # Concurrency
//!
//! `BitArray` has no interior mutability. It is `Send + Sync`, and shared
//! mutation is ruled out by the borrow checker rather than by locks.

pub mod bitarray;
pub mod error;

pub use bitarray::{BitArray, Iter, Word, BITS_PER_WORD};
pub use error::{BitArrayError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "dynbits";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
