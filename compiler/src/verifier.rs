use std::collections::{HashMap, HashSet};

use crate::{
    error::TbsError,
    types::{PrimitiveKind, SchemaIR, TypeInfo},
    utils::{
        escape_cpp_keyword, escape_rust_keyword, is_reserved_type_name, quote, rust_field_name,
        to_upper_snake_case,
    },
};

/// Names the generated code already uses for its runtime items.
pub const RESERVED_NAMES: [&str; 12] = [
    "ByteWriter",
    "ByteReader",
    "WireError",
    "LengthPrefix",
    "WireModel",
    "BinaryWriter",
    "BinaryReader",
    "BufferUnderflowError",
    "EnumDecodeError",
    "LengthOverflowError",
    "CommandIds",
    "CommandId",
];

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Enum,
    Model,
}

/// Returns `Ok(())` if verification passed, or `Err(TbsError::VerifierError(_))` otherwise.
///
/// On success every field type that names an enum has been retagged from
/// `TypeInfo::Model` to `TypeInfo::Enum`.
pub fn verify_schema(schema: &mut SchemaIR) -> Result<(), TbsError> {
    let mut defined_types: HashMap<String, Kind> = HashMap::new();

    // 1) Check duplicate / reserved type names
    let names = schema
        .enums
        .iter()
        .map(|e| (&e.name, Kind::Enum, e.line))
        .chain(schema.models.iter().map(|m| (&m.name, Kind::Model, m.line)));
    for (name, kind, line) in names {
        if defined_types.contains_key(name) || PrimitiveKind::from_name(name).is_some() {
            return Err(TbsError::VerifierError(format!(
                "The type {} is defined twice (line {})",
                quote(name),
                line
            )));
        }
        if RESERVED_NAMES.contains(&name.as_str()) || is_reserved_type_name(name) {
            return Err(TbsError::VerifierError(format!(
                "The type name {} is reserved (line {})",
                quote(name),
                line
            )));
        }
        defined_types.insert(name.clone(), kind);
    }

    // 2) Enum members
    for enum_def in &schema.enums {
        let mut names = HashSet::new();
        let mut values = HashMap::new();
        for member in &enum_def.members {
            if !names.insert(member.name.as_str()) {
                return Err(TbsError::VerifierError(format!(
                    "The member {} is defined twice in enum {}",
                    quote(&member.name),
                    quote(&enum_def.name)
                )));
            }
            if let Some(previous) = values.insert(member.value, member.name.as_str()) {
                return Err(TbsError::VerifierError(format!(
                    "The value {} of member {} is already used by {} in enum {}",
                    member.value,
                    quote(&member.name),
                    quote(previous),
                    quote(&enum_def.name)
                )));
            }
        }
    }

    // 3) Command ids are unique across models
    let mut command_ids: HashMap<u8, &str> = HashMap::new();
    for model in &schema.models {
        if let Some(id) = model.command_id {
            if let Some(previous) = command_ids.insert(id, model.name.as_str()) {
                return Err(TbsError::VerifierError(format!(
                    "The command id 0x{:02X} of model {} is already used by {}",
                    id,
                    quote(&model.name),
                    quote(previous)
                )));
            }
        }
    }

    // 4) Fields: unique names, resolvable types
    for model in &mut schema.models {
        let mut field_names = HashSet::new();
        for field in &mut model.fields {
            if !field_names.insert(field.name.clone()) {
                return Err(TbsError::VerifierError(format!(
                    "The field {} is defined twice in model {} (line {})",
                    quote(&field.name),
                    quote(&model.name),
                    field.line
                )));
            }

            resolve_type(&mut field.ty, &defined_types).map_err(|ty| {
                TbsError::VerifierError(format!(
                    "The type {} is not defined for field {} (line {})",
                    quote(&ty),
                    quote(&field.name),
                    field.line
                ))
            })?;

            if matches!(field.ty, TypeInfo::Enum(_)) && field.size.length_prefix.is_some() {
                return Err(TbsError::VerifierError(format!(
                    "The enum field {} cannot have a length prefix (line {})",
                    quote(&field.name),
                    field.line
                )));
            }
        }
    }

    // 5) Names must stay distinct after each generator renames them
    for enum_def in &schema.enums {
        let owner = format!("enum {}", quote(&enum_def.name));
        let members = || enum_def.members.iter().map(|m| m.name.as_str());
        check_distinct(members(), escape_rust_keyword, &owner)?;
        check_distinct(members(), escape_cpp_keyword, &owner)?;
    }
    for model in &schema.models {
        let owner = format!("model {}", quote(&model.name));
        let fields = || model.fields.iter().map(|f| f.name.as_str());
        check_distinct(fields(), rust_field_name, &owner)?;
        check_distinct(fields(), escape_cpp_keyword, &owner)?;
    }
    check_distinct(
        schema.commands().map(|(m, _)| m.name.as_str()),
        to_upper_snake_case,
        "the command id table",
    )?;

    Ok(())
}

fn check_distinct<'a>(
    names: impl Iterator<Item = &'a str>,
    rename: fn(&str) -> String,
    owner: &str,
) -> Result<(), TbsError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for name in names {
        let generated = rename(name);
        if let Some(previous) = seen.insert(generated.clone(), name) {
            return Err(TbsError::VerifierError(format!(
                "The names {} and {} in {} both generate {}",
                quote(previous),
                quote(name),
                owner,
                quote(&generated)
            )));
        }
    }
    Ok(())
}

/// Retags named references. Returns the unresolved name on failure.
fn resolve_type(ty: &mut TypeInfo, defined_types: &HashMap<String, Kind>) -> Result<(), String> {
    match ty {
        TypeInfo::Primitive(_) => Ok(()),
        TypeInfo::Array(element) => resolve_type(element, defined_types),
        TypeInfo::Enum(name) | TypeInfo::Model(name) => {
            let resolved = match defined_types.get(name.as_str()) {
                Some(Kind::Enum) => TypeInfo::Enum(std::mem::take(name)),
                Some(Kind::Model) => TypeInfo::Model(std::mem::take(name)),
                None => return Err(name.clone()),
            };
            *ty = resolved;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};

    fn verify(text: &str) -> Result<SchemaIR, TbsError> {
        let tokens = tokenize_schema(text)?;
        let mut ir = parse_schema(&tokens, "test.tsp", 0)?;
        verify_schema(&mut ir)?;
        Ok(ir)
    }

    fn verify_err(text: &str) -> String {
        match verify(text) {
            Err(e @ TbsError::VerifierError(_)) => e.to_string(),
            other => panic!("expected a VerifierError but got {:?}", other),
        }
    }

    #[test]
    fn test_retags_enum_references() {
        let ir = verify("enum S { A } model Inner { x: uint8; } model M { s: S; i: Inner; l: S[]; }").unwrap();
        let f = &ir.models[1].fields;
        assert_eq!(f[0].ty, TypeInfo::Enum("S".into()));
        assert_eq!(f[1].ty, TypeInfo::Model("Inner".into()));
        assert_eq!(f[2].ty, TypeInfo::Array(Box::new(TypeInfo::Enum("S".into()))));
    }

    #[test]
    fn test_forward_references_resolve() {
        assert!(verify("model A { b: B; } model B { x: uint8; }").is_ok());
    }

    #[test]
    fn test_undefined_type() {
        let msg = verify_err("model A { b: Missing; }");
        assert!(msg.contains("\"Missing\" is not defined"), "{}", msg);
        verify_err("model A { b: Missing[]; }");
    }

    #[test]
    fn test_duplicate_types() {
        assert!(verify_err("enum A { X } model A { x: uint8; }").contains("defined twice"));
        assert!(verify_err("model A { x: uint8; } model A { y: uint8; }").contains("defined twice"));
        assert!(verify_err("model uint8 { x: uint8; }").contains("defined twice"));
    }

    #[test]
    fn test_reserved_names() {
        assert!(verify_err("model ByteWriter { x: uint8; }").contains("reserved"));
        assert!(verify_err("enum WireError { A }").contains("reserved"));
        assert!(verify_err("model BinaryReader { x: uint8; }").contains("reserved"));
        assert!(verify_err("model class { x: uint8; }").contains("reserved"));
        assert!(verify_err("enum Self { A }").contains("reserved"));
    }

    #[test]
    fn test_generated_name_collisions() {
        let msg = verify_err("model M { fooBar: uint8; foo_bar: uint16; }");
        assert!(msg.contains("both generate \"foo_bar\""), "{}", msg);
        verify_err("model M { type: uint8; type_: uint8; }");
        verify_err("model M { new: uint8; new_: uint8; }");
        verify_err("enum E { self, self_ }");
        verify_err("@command_id(1) model PingCmd { } @command_id(2) model Ping_Cmd { }");

        // Keywords alone are escaped, not rejected.
        assert!(verify("enum E { type, delete } model M { class: uint8; type: E; COMMAND_ID: uint8; }").is_ok());
    }

    #[test]
    fn test_duplicate_members_and_values() {
        assert!(verify_err("enum E { A, A }").contains("defined twice"));
        assert!(verify_err("enum E { A, B, @value(1) C }").contains("already used"));
    }

    #[test]
    fn test_duplicate_fields() {
        assert!(verify_err("model M { x: uint8; x: uint16; }").contains("defined twice"));
    }

    #[test]
    fn test_duplicate_command_ids() {
        let msg = verify_err("@command_id(1) model A { x: uint8; } @command_id(0x01) model B { x: uint8; }");
        assert!(msg.contains("0x01"), "{}", msg);
    }

    #[test]
    fn test_length_prefix_on_enum_field() {
        let msg = verify_err("enum E { A } model M { @length_prefix(uint8) e: E; }");
        assert!(msg.contains("length prefix"), "{}", msg);
    }
}
