//! Runtime support for codecs generated by `tbs-compiler`.
//!
//! All multi-byte values are little-endian. Generated models implement
//! [`WireModel`] on top of [`ByteWriter`] and [`ByteReader`].

pub mod bb;
pub mod error;
pub mod traits;

pub use bb::{ByteReader, ByteWriter, LengthPrefix};
pub use error::WireError;
pub use traits::WireModel;
