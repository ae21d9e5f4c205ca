use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::{
    error::TbsError,
    generators::{generator_for, GeneratedFile, GeneratorConfig, Language},
    layout::calculate_layouts,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::SchemaIR,
    verifier::verify_schema,
};

/// Turn schema text into a verified, laid-out `SchemaIR`.
/// Returns `Err(TbsError)` if tokenization, parsing, verification or layout fails.
pub fn parse(text: &str, source_file: &str) -> Result<SchemaIR, TbsError> {
    let tokens = tokenize_schema(text)?;
    debug!(source_file, tokens = tokens.len(), "tokenized schema");

    let mut ir = parse_schema(&tokens, source_file, unix_now())?;
    debug!(enums = ir.enums.len(), models = ir.models.len(), "parsed schema");

    verify_schema(&mut ir)?;
    debug!("verified schema");

    calculate_layouts(&mut ir)?;
    debug!("calculated layouts");

    Ok(ir)
}

/// Compile a schema for each language with default generator settings.
pub fn compile(text: &str, source_file: &str, languages: &[Language]) -> Result<Vec<GeneratedFile>, TbsError> {
    compile_with(text, source_file, languages, &GeneratorConfig::default())
}

/// Compile a schema for each language. Every returned filename is prefixed
/// with the language directory, e.g. `rust/lib.rs`.
pub fn compile_with(
    text: &str,
    source_file: &str,
    languages: &[Language],
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedFile>, TbsError> {
    let mut ir = parse(text, source_file)?;
    if config.protocol_version.is_some() {
        ir.metadata.protocol_version = config.protocol_version.clone();
    }
    Ok(generate(&ir, languages, config))
}

/// Run the generators over an already parsed schema.
pub fn generate(ir: &SchemaIR, languages: &[Language], config: &GeneratorConfig) -> Vec<GeneratedFile> {
    let mut files = Vec::new();
    for &language in languages {
        let generator = generator_for(language, config);
        for file in generator.generate(ir) {
            debug!(%language, filename = %file.filename, bytes = file.content.len(), "generated file");
            files.push(GeneratedFile {
                filename: format!("{}/{}", language.dir_name(), file.filename),
                content: file.content,
            });
        }
    }
    files
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sets_metadata() {
        let ir = parse("namespace Demo; model A { x: uint8; }", "demo.tsp").unwrap();
        assert_eq!(ir.namespace, "Demo");
        assert_eq!(ir.metadata.source_file, "demo.tsp");
        assert!(ir.metadata.parsed_at > 0);
        assert_eq!(ir.metadata.protocol_version, None);
        assert_eq!(ir.models[0].fixed_size(), Some(1));
    }

    #[test]
    fn test_compile_prefixes_language_dirs() {
        let files = compile("model A { x: uint8; }", "a.tsp", &Language::ALL).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "rust/lib.rs",
                "typescript/types.ts",
                "typescript/serializer.ts",
                "typescript/index.ts",
                "cpp/protocol.hpp",
                "cpp/protocol.cpp",
            ]
        );
    }

    #[test]
    fn test_compile_with_protocol_version() {
        let config = GeneratorConfig {
            protocol_version: Some("1.2.0".to_string()),
            ..GeneratorConfig::default()
        };
        let files = compile_with("model A { x: uint8; }", "a.tsp", &[Language::Rust], &config).unwrap();
        assert!(files[0].content.contains("// Protocol version: 1.2.0"));
    }

    #[test]
    fn test_failed_compile_produces_nothing() {
        let err = compile("model A { b: Missing; }", "a.tsp", &Language::ALL).unwrap_err();
        assert!(matches!(err, TbsError::VerifierError(_)), "got {:?}", err);
    }
}
