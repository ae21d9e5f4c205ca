//! tbs
//!
//! One-stop crate for working with tbs protocol schemas.
//!
//! - The schema compiler (`parse`, `compile`) re-exported from `tbs-compiler`
//! - The wire runtime that generated Rust code builds on, from `tbs-wire`
//! - `parse_to_json` for inspecting the resolved IR

pub use tbs_compiler::{compile, compile_with, parse, GeneratedFile, GeneratorConfig, Language, SchemaIR, TbsError};
pub use tbs_wire::{ByteReader, ByteWriter, LengthPrefix, WireError, WireModel};

/// Parse a schema and render its IR as pretty-printed JSON.
pub fn parse_to_json(text: &str, source_file: &str) -> Result<String, TbsError> {
    let ir = parse(text, source_file)?;
    serde_json::to_string_pretty(&ir).map_err(|e| TbsError::Io(e.into()))
}

pub mod error {
    pub use tbs_compiler::error::TbsError;
    pub use tbs_wire::WireError;
}

pub mod types {
    pub use tbs_compiler::types::*;
}

pub mod generators {
    pub use tbs_compiler::generators::*;
}
