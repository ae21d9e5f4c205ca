//! tbs-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.tsp` protocol schemas (namespace, enums,
//!     models and decorators),
//!  2) A verifier (duplicate and reserved names, command ids, type resolution),
//!  3) A layout pass computing wire sizes, field offsets and cycle detection,
//!  4) Code generation for Rust, TypeScript and C++ (`compile` → files),
//!  5) Error types (`TbsError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod decorators;
pub mod parser;
pub mod verifier;
pub mod layout;
pub mod generators;
pub mod compiler;

pub use compiler::{compile, compile_with, generate, parse};
pub use error::TbsError;
pub use generators::{CodeGenerator, GeneratedFile, GeneratorConfig, Language};
pub use tokenizer::tokenize_schema as tokenize;
pub use types::SchemaIR;
