use crate::error::WireError;

/// A model with a generated binary codec.
pub trait WireModel: Sized {
    /// Encoded size when every field has a known width, `None` otherwise.
    const FIXED_SIZE: Option<usize>;

    fn serialize(&self) -> Result<Vec<u8>, WireError>;

    /// Decodes from the front of `data`. Trailing bytes are ignored.
    fn deserialize(data: &[u8]) -> Result<Self, WireError>;
}
