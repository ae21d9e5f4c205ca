use crate::{
    generators::{doc_lines, CodeGenerator, ElementCodec, FieldCodec, GeneratedFile, Language},
    types::{EnumDefinition, ModelDefinition, PrimitiveKind, SchemaIR},
    utils::{escape_rust_keyword, hex_byte, rust_field_name, to_upper_snake_case},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RustConfig {
    /// Path of the crate providing `ByteWriter`, `ByteReader` and friends.
    pub runtime_crate: String,
}

impl Default for RustConfig {
    fn default() -> Self {
        RustConfig {
            runtime_crate: "tbs_wire".to_string(),
        }
    }
}

/// Emits a single `lib.rs` that can be used as a module or pulled in with
/// `include!`, so it carries no inner attributes.
#[derive(Debug, Clone, Default)]
pub struct RustGenerator {
    config: RustConfig,
}

impl RustGenerator {
    pub fn new(config: RustConfig) -> RustGenerator {
        RustGenerator { config }
    }
}

impl CodeGenerator for RustGenerator {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn generate(&self, ir: &SchemaIR) -> Vec<GeneratedFile> {
        vec![GeneratedFile {
            filename: "lib.rs".to_string(),
            content: self.generate_lib(ir),
        }]
    }
}

impl RustGenerator {
    fn generate_lib(&self, ir: &SchemaIR) -> String {
        let mut rust_code: Vec<String> = Vec::new();

        rust_code.push("// Auto-generated binary protocol types. Do not edit.".to_string());
        rust_code.push(format!("// Generated from: {}", ir.metadata.source_file));
        rust_code.push(format!("// Generated at: {} (unix time)", ir.metadata.parsed_at));
        if !ir.namespace.is_empty() {
            rust_code.push(format!("// Namespace: {}", ir.namespace));
        }
        if let Some(version) = &ir.metadata.protocol_version {
            rust_code.push(format!("// Protocol version: {}", version));
        }
        rust_code.push("".to_string());
        rust_code.push(format!(
            "pub use {}::{{ByteReader, ByteWriter, LengthPrefix, WireError, WireModel}};",
            self.config.runtime_crate
        ));
        rust_code.push("".to_string());

        for enum_def in &ir.enums {
            rust_code.push(generate_enum(enum_def));
        }

        for model in &ir.models {
            rust_code.push(generate_struct(model, ir));
            rust_code.push(generate_wire_model(model, ir));
        }

        rust_code.push(generate_command_ids(ir));

        rust_code.join("\n")
    }
}

fn push_doc(lines: &mut Vec<String>, doc: &Option<String>, indent: &str) {
    for line in doc_lines(doc) {
        lines.push(format!("{}/// {}", indent, line).trim_end().to_string());
    }
}

/// Suffix of the `write_*`/`read_*` cursor methods for a scalar kind.
fn method_suffix(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Uint8 => "u8",
        PrimitiveKind::Uint16 => "u16",
        PrimitiveKind::Uint32 => "u32",
        PrimitiveKind::Uint64 => "u64",
        PrimitiveKind::Int8 => "i8",
        PrimitiveKind::Int16 => "i16",
        PrimitiveKind::Int32 => "i32",
        PrimitiveKind::Int64 => "i64",
        PrimitiveKind::Float32 => "f32",
        PrimitiveKind::Float64 => "f64",
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::String | PrimitiveKind::Bytes => "bytes",
    }
}

fn scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "String",
        PrimitiveKind::Bytes => "Vec<u8>",
        other => method_suffix(other),
    }
}

fn length_prefix(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Uint8 => "LengthPrefix::U8",
        PrimitiveKind::Uint16 => "LengthPrefix::U16",
        PrimitiveKind::Uint32 => "LengthPrefix::U32",
        _ => "LengthPrefix::U64",
    }
}

fn element_type(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => scalar_type(kind).to_string(),
        ElementCodec::Enum(name) | ElementCodec::Model { name, .. } => name.to_string(),
    }
}

fn field_type(codec: FieldCodec) -> String {
    match codec {
        FieldCodec::Scalar(kind) => scalar_type(kind).to_string(),
        FieldCodec::FixedString(_) | FieldCodec::PrefixedString(_) | FieldCodec::RemainingString => {
            "String".to_string()
        }
        FieldCodec::FixedBytes(n) => format!("[u8; {}]", n),
        FieldCodec::PrefixedBytes(_) | FieldCodec::RemainingBytes => "Vec<u8>".to_string(),
        FieldCodec::Enum(name) | FieldCodec::Model { name, .. } | FieldCodec::PrefixedModel { name, .. } => {
            name.to_string()
        }
        FieldCodec::PrefixedArray { element, .. } | FieldCodec::RemainingArray(element) => {
            format!("Vec<{}>", element_type(element))
        }
    }
}

/// Generates a `#[repr(u8)]` enum with its fallible byte conversion.
fn generate_enum(enum_def: &EnumDefinition) -> String {
    let mut lines = Vec::new();
    let name = &enum_def.name;

    push_doc(&mut lines, &enum_def.doc, "");
    lines.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]".to_string());
    if !enum_def.members.is_empty() {
        lines.push("#[repr(u8)]".to_string());
    }
    lines.push(format!("pub enum {} {{", name));
    for member in &enum_def.members {
        push_doc(&mut lines, &member.doc, "    ");
        lines.push(format!("    {} = {},", escape_rust_keyword(&member.name), member.value));
    }
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("impl TryFrom<u8> for {} {{", name));
    lines.push("    type Error = WireError;".to_string());
    lines.push("".to_string());
    lines.push("    fn try_from(value: u8) -> Result<Self, WireError> {".to_string());
    lines.push("        match value {".to_string());
    for member in &enum_def.members {
        lines.push(format!(
            "            {} => Ok({}::{}),",
            member.value,
            name,
            escape_rust_keyword(&member.name)
        ));
    }
    lines.push(format!(
        "            _ => Err(WireError::InvalidEnumValue {{ name: \"{}\", value }}),",
        name
    ));
    lines.push("        }".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    if !enum_def.members.is_empty() {
        lines.push(format!("impl From<{}> for u8 {{", name));
        lines.push(format!("    fn from(value: {}) -> u8 {{", name));
        lines.push("        value as u8".to_string());
        lines.push("    }".to_string());
        lines.push("}".to_string());
        lines.push("".to_string());
    }

    lines.join("\n")
}

fn generate_struct(model: &ModelDefinition, ir: &SchemaIR) -> String {
    let mut lines = Vec::new();

    push_doc(&mut lines, &model.doc, "");
    if let Some(id) = model.command_id {
        lines.push(format!("/// Command ID: {}", hex_byte(id)));
    }
    lines.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    lines.push(format!("pub struct {} {{", model.name));
    for field in &model.fields {
        push_doc(&mut lines, &field.doc, "    ");
        lines.push(format!(
            "    pub {}: {},",
            rust_field_name(&field.name),
            field_type(FieldCodec::of(field, ir))
        ));
    }
    lines.push("}".to_string());
    lines.push("".to_string());

    if let Some(id) = model.command_id {
        lines.push(format!("impl {} {{", model.name));
        lines.push(format!("    pub const COMMAND_ID: u8 = {};", hex_byte(id)));
        lines.push("}".to_string());
        lines.push("".to_string());
    }

    lines.join("\n")
}

fn generate_wire_model(model: &ModelDefinition, ir: &SchemaIR) -> String {
    let mut lines = Vec::new();
    let fixed_size = match model.fixed_size() {
        Some(n) => format!("Some({})", n),
        None => "None".to_string(),
    };

    lines.push(format!("impl WireModel for {} {{", model.name));
    lines.push(format!("    const FIXED_SIZE: Option<usize> = {};", fixed_size));
    lines.push("".to_string());

    // serialize
    lines.push("    fn serialize(&self) -> Result<Vec<u8>, WireError> {".to_string());
    if model.fields.is_empty() {
        lines.push("        Ok(Vec::new())".to_string());
    } else {
        match model.fixed_size() {
            Some(n) => lines.push(format!("        let mut writer = ByteWriter::with_capacity({});", n)),
            None => lines.push("        let mut writer = ByteWriter::new();".to_string()),
        }
        for field in &model.fields {
            let accessor = format!("self.{}", rust_field_name(&field.name));
            lines.push(format!("        {}", write_statement(FieldCodec::of(field, ir), &accessor)));
        }
        lines.push("        Ok(writer.data())".to_string());
    }
    lines.push("    }".to_string());
    lines.push("".to_string());

    // deserialize
    lines.push("    fn deserialize(data: &[u8]) -> Result<Self, WireError> {".to_string());
    if model.fields.is_empty() {
        lines.push("        let _ = data;".to_string());
        lines.push(format!("        Ok({} {{}})", model.name));
    } else {
        lines.push("        let mut reader = ByteReader::new(data);".to_string());
        lines.push(format!("        Ok({} {{", model.name));
        for field in &model.fields {
            lines.push(format!(
                "            {}: {},",
                rust_field_name(&field.name),
                read_expression(FieldCodec::of(field, ir))
            ));
        }
        lines.push("        })".to_string());
    }
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.join("\n")
}

fn write_statement(codec: FieldCodec, accessor: &str) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("writer.write_{}({});", method_suffix(kind), accessor),
        FieldCodec::FixedString(n) => format!("writer.write_fixed_string(&{}, {});", accessor, n),
        FieldCodec::FixedBytes(_) => format!("writer.write_bytes(&{});", accessor),
        FieldCodec::PrefixedString(prefix) => format!(
            "writer.write_length_prefixed({}, {}.as_bytes())?;",
            length_prefix(prefix),
            accessor
        ),
        FieldCodec::PrefixedBytes(prefix) => format!(
            "writer.write_length_prefixed({}, &{})?;",
            length_prefix(prefix),
            accessor
        ),
        FieldCodec::RemainingString => format!("writer.write_bytes({}.as_bytes());", accessor),
        FieldCodec::RemainingBytes => format!("writer.write_bytes(&{});", accessor),
        FieldCodec::Enum(_) => format!("writer.write_u8({} as u8);", accessor),
        FieldCodec::Model { .. } => format!("writer.write_bytes(&{}.serialize()?);", accessor),
        FieldCodec::PrefixedModel { prefix, .. } => format!(
            "writer.write_length_prefixed({}, &{}.serialize()?)?;",
            length_prefix(prefix),
            accessor
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "writer.write_length_prefixed_items({}, &{}, |w, item| {{ {} Ok(()) }})?;",
            length_prefix(prefix),
            accessor,
            write_element(element)
        ),
        FieldCodec::RemainingArray(element) => format!(
            "writer.write_items(&{}, |w, item| {{ {} Ok(()) }})?;",
            accessor,
            write_element(element)
        ),
    }
}

fn write_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("w.write_{}(*item);", method_suffix(kind)),
        ElementCodec::Enum(_) => "w.write_u8(*item as u8);".to_string(),
        ElementCodec::Model { .. } => "w.write_bytes(&item.serialize()?);".to_string(),
    }
}

fn read_expression(codec: FieldCodec) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("reader.read_{}()?", method_suffix(kind)),
        FieldCodec::FixedString(n) => format!("reader.read_fixed_string({})?", n),
        FieldCodec::FixedBytes(n) => format!("reader.read_array::<{}>()?", n),
        FieldCodec::PrefixedString(prefix) => {
            format!("reader.read_length_prefixed_string({})?", length_prefix(prefix))
        }
        FieldCodec::PrefixedBytes(prefix) => {
            format!("reader.read_length_prefixed({})?.to_vec()", length_prefix(prefix))
        }
        FieldCodec::RemainingString => "reader.read_remaining_string()".to_string(),
        FieldCodec::RemainingBytes => "reader.read_remaining().to_vec()".to_string(),
        FieldCodec::Enum(name) => format!("{}::try_from(reader.read_u8()?)?", name),
        FieldCodec::Model { name, size } => format!("{}::deserialize(reader.read_bytes({})?)?", name, size),
        FieldCodec::PrefixedModel { name, prefix } => format!(
            "{}::deserialize(reader.read_length_prefixed({})?)?",
            name,
            length_prefix(prefix)
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "reader.read_length_prefixed_items({}, |r| {})?",
            length_prefix(prefix),
            read_element(element)
        ),
        FieldCodec::RemainingArray(element) => format!("reader.read_items(|r| {})?", read_element(element)),
    }
}

fn read_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("r.read_{}()", method_suffix(kind)),
        ElementCodec::Enum(name) => format!("{}::try_from(r.read_u8()?)", name),
        ElementCodec::Model { name, size } => format!("{}::deserialize(r.read_bytes({})?)", name, size),
    }
}

fn generate_command_ids(ir: &SchemaIR) -> String {
    let mut lines = Vec::new();
    lines.push("/// Command ID constants".to_string());
    lines.push("pub mod command_ids {".to_string());
    for (model, id) in ir.commands() {
        lines.push(format!(
            "    pub const {}: u8 = {};",
            to_upper_snake_case(&model.name),
            hex_byte(id)
        ));
    }
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.join("\n")
}
