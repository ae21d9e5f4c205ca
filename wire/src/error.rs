use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer underflow: needed {needed} bytes but only {available} remain")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("invalid value {value} for enum {name}")]
    InvalidEnumValue { name: &'static str, value: u8 },

    #[error("length {len} exceeds the prefix maximum of {max}")]
    LengthOverflow { len: usize, max: u64 },

    #[error("array item consumed no bytes with {remaining} bytes left")]
    EmptyItem { remaining: usize },
}
