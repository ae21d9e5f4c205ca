//! Code generators. Each backend is a pure function of a laid-out
//! [`SchemaIR`] and all of them classify fields through [`FieldCodec`], so
//! the emitted codecs agree on the wire format.

pub mod cpp;
pub mod rust;
pub mod typescript;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::types::{FieldDefinition, PrimitiveKind, SchemaIR, TypeInfo};

pub use cpp::{CppConfig, CppGenerator};
pub use rust::{RustConfig, RustGenerator};
pub use typescript::TypeScriptGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub content:  String,
}

pub trait CodeGenerator {
    fn language(&self) -> Language;

    fn generate(&self, ir: &SchemaIR) -> Vec<GeneratedFile>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Rust, Language::TypeScript, Language::Cpp];

    /// Directory the language's files are written under.
    pub fn dir_name(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Language::Rust),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(format!(
                "unknown language \"{}\" (expected rust, typescript or cpp)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorConfig {
    /// Stamped into the IR metadata and every generated file header.
    pub protocol_version: Option<String>,
    pub rust:             RustConfig,
    pub cpp:              CppConfig,
}

pub fn generator_for(language: Language, config: &GeneratorConfig) -> Box<dyn CodeGenerator> {
    match language {
        Language::Rust => Box::new(RustGenerator::new(config.rust.clone())),
        Language::TypeScript => Box::new(TypeScriptGenerator),
        Language::Cpp => Box::new(CppGenerator::new(config.cpp.clone())),
    }
}

/// The shape of an array element on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementCodec<'a> {
    Scalar(PrimitiveKind),
    Enum(&'a str),
    Model { name: &'a str, size: usize },
}

/// How one field is written and read. Layout guarantees every case is
/// well-formed: arrays have fixed-size elements and unprefixed nested models
/// have a fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldCodec<'a> {
    Scalar(PrimitiveKind),
    FixedString(usize),
    FixedBytes(usize),
    PrefixedString(PrimitiveKind),
    PrefixedBytes(PrimitiveKind),
    RemainingString,
    RemainingBytes,
    Enum(&'a str),
    Model { name: &'a str, size: usize },
    PrefixedModel { name: &'a str, prefix: PrimitiveKind },
    PrefixedArray { element: ElementCodec<'a>, prefix: PrimitiveKind },
    RemainingArray(ElementCodec<'a>),
}

impl<'a> FieldCodec<'a> {
    pub fn of(field: &'a FieldDefinition, ir: &'a SchemaIR) -> FieldCodec<'a> {
        let prefix = field.size.length_prefix;
        match (&field.ty, prefix) {
            (TypeInfo::Array(element), Some(prefix)) => FieldCodec::PrefixedArray {
                element: ElementCodec::of(element, ir),
                prefix,
            },
            (TypeInfo::Array(element), None) => FieldCodec::RemainingArray(ElementCodec::of(element, ir)),
            (TypeInfo::Enum(name), _) => FieldCodec::Enum(name),
            (TypeInfo::Model(name), Some(prefix)) => FieldCodec::PrefixedModel { name, prefix },
            (TypeInfo::Model(name), None) => FieldCodec::Model {
                name,
                size: model_size(name, ir),
            },
            (TypeInfo::Primitive(PrimitiveKind::String), Some(prefix)) => FieldCodec::PrefixedString(prefix),
            (TypeInfo::Primitive(PrimitiveKind::Bytes), Some(prefix)) => FieldCodec::PrefixedBytes(prefix),
            (TypeInfo::Primitive(PrimitiveKind::String), None) => match field.size.fixed_size {
                Some(n) => FieldCodec::FixedString(n),
                None => FieldCodec::RemainingString,
            },
            (TypeInfo::Primitive(PrimitiveKind::Bytes), None) => match field.size.fixed_size {
                Some(n) => FieldCodec::FixedBytes(n),
                None => FieldCodec::RemainingBytes,
            },
            (TypeInfo::Primitive(kind), _) => FieldCodec::Scalar(*kind),
        }
    }
}

impl<'a> ElementCodec<'a> {
    fn of(element: &'a TypeInfo, ir: &'a SchemaIR) -> ElementCodec<'a> {
        match element {
            TypeInfo::Enum(name) => ElementCodec::Enum(name),
            TypeInfo::Model(name) => ElementCodec::Model {
                name,
                size: model_size(name, ir),
            },
            TypeInfo::Primitive(kind) => ElementCodec::Scalar(*kind),
            // Nested arrays never reach a generator.
            TypeInfo::Array(inner) => ElementCodec::of(inner, ir),
        }
    }
}

fn model_size(name: &str, ir: &SchemaIR) -> usize {
    ir.find_model(name)
        .and_then(|m| m.fixed_size())
        .unwrap_or_default()
}

/// Splits a doc comment into lines for re-emission.
pub(crate) fn doc_lines(doc: &Option<String>) -> Vec<&str> {
    doc.as_deref().map(|d| d.lines().collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse;

    #[test]
    fn test_language_from_str() {
        assert_eq!("rust".parse::<Language>(), Ok(Language::Rust));
        assert_eq!("RS".parse::<Language>(), Ok(Language::Rust));
        assert_eq!("ts".parse::<Language>(), Ok(Language::TypeScript));
        assert_eq!("c++".parse::<Language>(), Ok(Language::Cpp));
        assert!("go".parse::<Language>().is_err());
        assert_eq!(Language::TypeScript.to_string(), "typescript");
    }

    #[test]
    fn test_field_codecs() {
        let ir = parse(
            "enum E { A } \
             model V { x: float32; y: float32; } \
             model M { a: uint16; b: E; @size(4) c: string; @size(2) d: bytes; \
                       @length_prefix(uint8) e: string; @length_prefix(uint32) f: bytes; \
                       v: V; @length_prefix(uint16) g: V[]; h: E[]; }",
            "test.tsp",
        )
        .unwrap();
        let m = &ir.models[1];
        let codecs: Vec<_> = m.fields.iter().map(|f| FieldCodec::of(f, &ir)).collect();
        assert_eq!(
            codecs,
            vec![
                FieldCodec::Scalar(PrimitiveKind::Uint16),
                FieldCodec::Enum("E"),
                FieldCodec::FixedString(4),
                FieldCodec::FixedBytes(2),
                FieldCodec::PrefixedString(PrimitiveKind::Uint8),
                FieldCodec::PrefixedBytes(PrimitiveKind::Uint32),
                FieldCodec::Model { name: "V", size: 8 },
                FieldCodec::PrefixedArray {
                    element: ElementCodec::Model { name: "V", size: 8 },
                    prefix: PrimitiveKind::Uint16,
                },
                FieldCodec::RemainingArray(ElementCodec::Enum("E")),
            ]
        );
    }

    #[test]
    fn test_generator_for_each_language() {
        let config = GeneratorConfig::default();
        for language in Language::ALL {
            assert_eq!(generator_for(language, &config).language(), language);
        }
    }
}
