use std::collections::HashSet;

use crate::{
    generators::{doc_lines, CodeGenerator, ElementCodec, FieldCodec, GeneratedFile, Language},
    types::{EnumDefinition, ModelDefinition, PrimitiveKind, SchemaIR},
    utils::{escape_cpp_keyword, hex_byte, to_upper_snake_case},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CppConfig {
    /// Overrides the namespace derived from the schema.
    pub namespace: Option<String>,
}

/// Emits `protocol.hpp` and `protocol.cpp`.
#[derive(Debug, Clone, Default)]
pub struct CppGenerator {
    config: CppConfig,
}

impl CppGenerator {
    pub fn new(config: CppConfig) -> CppGenerator {
        CppGenerator { config }
    }

    /// `a.b.C` becomes `a_b_c`; an empty namespace becomes `binary_protocol`.
    pub fn namespace(&self, ir: &SchemaIR) -> String {
        if let Some(ns) = &self.config.namespace {
            return ns.clone();
        }
        let ns = ir.namespace.replace('.', "_").to_lowercase();
        if ns.is_empty() {
            "binary_protocol".to_string()
        } else {
            ns
        }
    }
}

impl CodeGenerator for CppGenerator {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn generate(&self, ir: &SchemaIR) -> Vec<GeneratedFile> {
        let ns = self.namespace(ir);
        vec![
            GeneratedFile {
                filename: "protocol.hpp".to_string(),
                content: generate_header(ir, &ns),
            },
            GeneratedFile {
                filename: "protocol.cpp".to_string(),
                content: generate_source(ir, &ns),
            },
        ]
    }
}

const HEADER_RUNTIME: &str = r#"class BufferUnderflowError : public std::runtime_error {
public:
    BufferUnderflowError(size_t needed, size_t available)
        : std::runtime_error("Buffer underflow: needed " + std::to_string(needed) +
                             " bytes but only " + std::to_string(available) + " available"),
          needed(needed), available(available) {}

    size_t needed;
    size_t available;
};

class EnumDecodeError : public std::runtime_error {
public:
    EnumDecodeError(const std::string& enumName, uint8_t value)
        : std::runtime_error("Invalid value " + std::to_string(value) + " for enum " + enumName),
          enumName(enumName), value(value) {}

    std::string enumName;
    uint8_t value;
};

class LengthOverflowError : public std::runtime_error {
public:
    LengthOverflowError(size_t length, uint64_t max)
        : std::runtime_error("Length " + std::to_string(length) +
                             " does not fit in a prefix with maximum " + std::to_string(max)),
          length(length), max(max) {}

    size_t length;
    uint64_t max;
};

/**
 * Little-endian binary writer
 */
class BinaryWriter {
public:
    void writeUint8(uint8_t value);
    void writeUint16(uint16_t value);
    void writeUint32(uint32_t value);
    void writeUint64(uint64_t value);
    void writeInt8(int8_t value);
    void writeInt16(int16_t value);
    void writeInt32(int32_t value);
    void writeInt64(int64_t value);
    void writeFloat32(float value);
    void writeFloat64(double value);
    void writeBool(bool value);

    void writeFixedString(const std::string& value, size_t size);
    void writeString(const std::string& value);

    void writeBytes(const uint8_t* data, size_t size);
    void writeBytes(const std::vector<uint8_t>& data);

    template<size_t N>
    void writeBytes(const std::array<uint8_t, N>& data) {
        writeBytes(data.data(), N);
    }

    /** Byte count of `prefixWidth` bytes followed by the payload. */
    void writeLengthPrefixed(const std::vector<uint8_t>& data, size_t prefixWidth);
    void writeLengthPrefixedString(const std::string& value, size_t prefixWidth);

    template<typename T, typename F>
    void writeItems(const std::vector<T>& items, F writeItem) {
        for (const auto& item : items) {
            writeItem(*this, item);
        }
    }

    template<typename T, typename F>
    void writeLengthPrefixedItems(const std::vector<T>& items, size_t prefixWidth, F writeItem) {
        BinaryWriter scratch;
        scratch.writeItems(items, writeItem);
        writeLengthPrefixed(scratch.data(), prefixWidth);
    }

    const std::vector<uint8_t>& data() const { return buffer_; }
    size_t size() const { return buffer_.size(); }

private:
    std::vector<uint8_t> buffer_;
};

/**
 * Little-endian binary reader. Reads past the end throw BufferUnderflowError.
 */
class BinaryReader {
public:
    BinaryReader(const uint8_t* data, size_t size);

    uint8_t readUint8();
    uint16_t readUint16();
    uint32_t readUint32();
    uint64_t readUint64();
    int8_t readInt8();
    int16_t readInt16();
    int32_t readInt32();
    int64_t readInt64();
    float readFloat32();
    double readFloat64();
    bool readBool();

    std::string readFixedString(size_t size);
    std::vector<uint8_t> readBytes(size_t length);
    std::vector<uint8_t> readRemaining();
    std::string readRemainingString();
    std::vector<uint8_t> readLengthPrefixed(size_t prefixWidth);
    std::string readLengthPrefixedString(size_t prefixWidth);

    template<size_t N>
    std::array<uint8_t, N> readFixedBytes() {
        ensure(N);
        std::array<uint8_t, N> result{};
        std::memcpy(result.data(), data_ + offset_, N);
        offset_ += N;
        return result;
    }

    template<typename T, typename F>
    std::vector<T> readItems(F readItem) {
        std::vector<T> items;
        while (remaining() > 0) {
            size_t start = offset_;
            items.push_back(readItem(*this));
            if (offset_ == start) {
                throw std::runtime_error("Array item consumed no bytes");
            }
        }
        return items;
    }

    template<typename T, typename F>
    std::vector<T> readLengthPrefixedItems(size_t prefixWidth, F readItem) {
        std::vector<uint8_t> span = readLengthPrefixed(prefixWidth);
        BinaryReader inner(span.data(), span.size());
        return inner.readItems<T>(readItem);
    }

    size_t position() const { return offset_; }
    size_t remaining() const { return size_ - offset_; }

private:
    void ensure(size_t size) const;

    const uint8_t* data_;
    size_t size_;
    size_t offset_ = 0;
};
"#;

const SOURCE_RUNTIME: &str = r#"// BinaryWriter implementation
void BinaryWriter::writeUint8(uint8_t value) {
    buffer_.push_back(value);
}

void BinaryWriter::writeUint16(uint16_t value) {
    buffer_.push_back(value & 0xFF);
    buffer_.push_back((value >> 8) & 0xFF);
}

void BinaryWriter::writeUint32(uint32_t value) {
    for (int i = 0; i < 4; i++) {
        buffer_.push_back((value >> (i * 8)) & 0xFF);
    }
}

void BinaryWriter::writeUint64(uint64_t value) {
    for (int i = 0; i < 8; i++) {
        buffer_.push_back((value >> (i * 8)) & 0xFF);
    }
}

void BinaryWriter::writeInt8(int8_t value) {
    writeUint8(static_cast<uint8_t>(value));
}

void BinaryWriter::writeInt16(int16_t value) {
    writeUint16(static_cast<uint16_t>(value));
}

void BinaryWriter::writeInt32(int32_t value) {
    writeUint32(static_cast<uint32_t>(value));
}

void BinaryWriter::writeInt64(int64_t value) {
    writeUint64(static_cast<uint64_t>(value));
}

void BinaryWriter::writeFloat32(float value) {
    uint32_t bits;
    std::memcpy(&bits, &value, sizeof(bits));
    writeUint32(bits);
}

void BinaryWriter::writeFloat64(double value) {
    uint64_t bits;
    std::memcpy(&bits, &value, sizeof(bits));
    writeUint64(bits);
}

void BinaryWriter::writeBool(bool value) {
    writeUint8(value ? 1 : 0);
}

void BinaryWriter::writeFixedString(const std::string& value, size_t size) {
    size_t used = value.size() < size ? value.size() : size;
    writeBytes(reinterpret_cast<const uint8_t*>(value.data()), used);
    buffer_.insert(buffer_.end(), size - used, 0);
}

void BinaryWriter::writeString(const std::string& value) {
    writeBytes(reinterpret_cast<const uint8_t*>(value.data()), value.size());
}

void BinaryWriter::writeBytes(const uint8_t* data, size_t size) {
    buffer_.insert(buffer_.end(), data, data + size);
}

void BinaryWriter::writeBytes(const std::vector<uint8_t>& data) {
    buffer_.insert(buffer_.end(), data.begin(), data.end());
}

void BinaryWriter::writeLengthPrefixed(const std::vector<uint8_t>& data, size_t prefixWidth) {
    uint64_t max = prefixWidth >= 8 ? UINT64_MAX : ((uint64_t{1} << (prefixWidth * 8)) - 1);
    if (static_cast<uint64_t>(data.size()) > max) {
        throw LengthOverflowError(data.size(), max);
    }
    switch (prefixWidth) {
        case 1:
            writeUint8(static_cast<uint8_t>(data.size()));
            break;
        case 2:
            writeUint16(static_cast<uint16_t>(data.size()));
            break;
        case 4:
            writeUint32(static_cast<uint32_t>(data.size()));
            break;
        default:
            writeUint64(static_cast<uint64_t>(data.size()));
            break;
    }
    writeBytes(data);
}

void BinaryWriter::writeLengthPrefixedString(const std::string& value, size_t prefixWidth) {
    writeLengthPrefixed(std::vector<uint8_t>(value.begin(), value.end()), prefixWidth);
}

// BinaryReader implementation
BinaryReader::BinaryReader(const uint8_t* data, size_t size)
    : data_(data), size_(size) {}

void BinaryReader::ensure(size_t size) const {
    if (size > remaining()) {
        throw BufferUnderflowError(size, remaining());
    }
}

uint8_t BinaryReader::readUint8() {
    ensure(1);
    return data_[offset_++];
}

uint16_t BinaryReader::readUint16() {
    ensure(2);
    uint16_t value = static_cast<uint16_t>(data_[offset_]) |
                     (static_cast<uint16_t>(data_[offset_ + 1]) << 8);
    offset_ += 2;
    return value;
}

uint32_t BinaryReader::readUint32() {
    ensure(4);
    uint32_t value = 0;
    for (int i = 0; i < 4; i++) {
        value |= static_cast<uint32_t>(data_[offset_ + i]) << (i * 8);
    }
    offset_ += 4;
    return value;
}

uint64_t BinaryReader::readUint64() {
    ensure(8);
    uint64_t value = 0;
    for (int i = 0; i < 8; i++) {
        value |= static_cast<uint64_t>(data_[offset_ + i]) << (i * 8);
    }
    offset_ += 8;
    return value;
}

int8_t BinaryReader::readInt8() {
    return static_cast<int8_t>(readUint8());
}

int16_t BinaryReader::readInt16() {
    return static_cast<int16_t>(readUint16());
}

int32_t BinaryReader::readInt32() {
    return static_cast<int32_t>(readUint32());
}

int64_t BinaryReader::readInt64() {
    return static_cast<int64_t>(readUint64());
}

float BinaryReader::readFloat32() {
    uint32_t bits = readUint32();
    float value;
    std::memcpy(&value, &bits, sizeof(value));
    return value;
}

double BinaryReader::readFloat64() {
    uint64_t bits = readUint64();
    double value;
    std::memcpy(&value, &bits, sizeof(value));
    return value;
}

bool BinaryReader::readBool() {
    return readUint8() != 0;
}

std::string BinaryReader::readFixedString(size_t size) {
    ensure(size);
    const char* start = reinterpret_cast<const char*>(data_ + offset_);
    offset_ += size;
    size_t length = 0;
    while (length < size && start[length] != '\0') {
        length++;
    }
    return std::string(start, length);
}

std::vector<uint8_t> BinaryReader::readBytes(size_t length) {
    ensure(length);
    std::vector<uint8_t> result(data_ + offset_, data_ + offset_ + length);
    offset_ += length;
    return result;
}

std::vector<uint8_t> BinaryReader::readRemaining() {
    return readBytes(remaining());
}

std::string BinaryReader::readRemainingString() {
    std::vector<uint8_t> bytes = readRemaining();
    return std::string(bytes.begin(), bytes.end());
}

std::vector<uint8_t> BinaryReader::readLengthPrefixed(size_t prefixWidth) {
    uint64_t length;
    switch (prefixWidth) {
        case 1:
            length = readUint8();
            break;
        case 2:
            length = readUint16();
            break;
        case 4:
            length = readUint32();
            break;
        default:
            length = readUint64();
            break;
    }
    if (length > remaining()) {
        throw BufferUnderflowError(static_cast<size_t>(length), remaining());
    }
    return readBytes(static_cast<size_t>(length));
}

std::string BinaryReader::readLengthPrefixedString(size_t prefixWidth) {
    std::vector<uint8_t> bytes = readLengthPrefixed(prefixWidth);
    return std::string(bytes.begin(), bytes.end());
}
"#;

fn push_doc(lines: &mut Vec<String>, doc: &Option<String>, indent: &str) {
    for line in doc_lines(doc) {
        lines.push(format!("{}/// {}", indent, line).trim_end().to_string());
    }
}

fn scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Uint8 => "uint8_t",
        PrimitiveKind::Uint16 => "uint16_t",
        PrimitiveKind::Uint32 => "uint32_t",
        PrimitiveKind::Uint64 => "uint64_t",
        PrimitiveKind::Int8 => "int8_t",
        PrimitiveKind::Int16 => "int16_t",
        PrimitiveKind::Int32 => "int32_t",
        PrimitiveKind::Int64 => "int64_t",
        PrimitiveKind::Float32 => "float",
        PrimitiveKind::Float64 => "double",
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::String => "std::string",
        PrimitiveKind::Bytes => "std::vector<uint8_t>",
    }
}

fn accessor(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Uint8 => "Uint8",
        PrimitiveKind::Uint16 => "Uint16",
        PrimitiveKind::Uint32 => "Uint32",
        PrimitiveKind::Uint64 => "Uint64",
        PrimitiveKind::Int8 => "Int8",
        PrimitiveKind::Int16 => "Int16",
        PrimitiveKind::Int32 => "Int32",
        PrimitiveKind::Int64 => "Int64",
        PrimitiveKind::Float32 => "Float32",
        PrimitiveKind::Float64 => "Float64",
        PrimitiveKind::Bool => "Bool",
        PrimitiveKind::String => "String",
        PrimitiveKind::Bytes => "Bytes",
    }
}

fn prefix_width(kind: PrimitiveKind) -> usize {
    kind.natural_size().unwrap_or(8)
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
            "std::string".to_string()
        }
        FieldCodec::FixedBytes(n) => format!("std::array<uint8_t, {}>", n),
        FieldCodec::PrefixedBytes(_) | FieldCodec::RemainingBytes => "std::vector<uint8_t>".to_string(),
        FieldCodec::Enum(name) | FieldCodec::Model { name, .. } | FieldCodec::PrefixedModel { name, .. } => {
            name.to_string()
        }
        FieldCodec::PrefixedArray { element, .. } | FieldCodec::RemainingArray(element) => {
            format!("std::vector<{}>", element_type(element))
        }
    }
}

fn banner(lines: &mut Vec<String>, title: &str, ir: &SchemaIR) {
    lines.push("/**".to_string());
    lines.push(format!(" * {}", title));
    lines.push(format!(" * Generated from: {}", ir.metadata.source_file));
    lines.push(format!(" * Generated at: {} (unix time)", ir.metadata.parsed_at));
    if let Some(version) = &ir.metadata.protocol_version {
        lines.push(format!(" * Protocol version: {}", version));
    }
    lines.push(" */".to_string());
    lines.push("".to_string());
}

fn generate_header(ir: &SchemaIR, ns: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    banner(&mut lines, "Auto-generated binary protocol types", ir);

    lines.push("#ifndef BINARY_PROTOCOL_HPP".to_string());
    lines.push("#define BINARY_PROTOCOL_HPP".to_string());
    lines.push("".to_string());
    for include in ["cstdint", "cstring", "string", "vector", "array", "stdexcept"] {
        lines.push(format!("#include <{}>", include));
    }
    lines.push("".to_string());
    lines.push(format!("namespace {} {{", ns));
    lines.push("".to_string());
    lines.push(HEADER_RUNTIME.to_string());

    for enum_def in &ir.enums {
        push_doc(&mut lines, &enum_def.doc, "");
        lines.push(format!("enum class {} : uint8_t {{", enum_def.name));
        for member in &enum_def.members {
            push_doc(&mut lines, &member.doc, "    ");
            lines.push(format!("    {} = {},", escape_cpp_keyword(&member.name), member.value));
        }
        lines.push("};".to_string());
        lines.push("".to_string());
        lines.push(format!("{} decode{}(uint8_t value);", enum_def.name, enum_def.name));
        lines.push("".to_string());
    }

    if !ir.models.is_empty() {
        for model in &ir.models {
            lines.push(format!("struct {};", model.name));
        }
        lines.push("".to_string());
    }

    for model in struct_order(ir) {
        push_doc(&mut lines, &model.doc, "");
        if let Some(id) = model.command_id {
            lines.push(format!("// Command ID: {}", hex_byte(id)));
        }
        lines.push(format!("struct {} {{", model.name));
        for field in &model.fields {
            push_doc(&mut lines, &field.doc, "    ");
            lines.push(format!(
                "    {} {}{{}};",
                field_type(FieldCodec::of(field, ir)),
                escape_cpp_keyword(&field.name)
            ));
        }
        let mut constants = Vec::new();
        if let Some(id) = model.command_id {
            constants.push(format!("    static constexpr uint8_t COMMAND_ID = {};", hex_byte(id)));
        }
        if let Some(size) = model.fixed_size() {
            constants.push(format!("    static constexpr size_t FIXED_SIZE = {};", size));
        }
        if !constants.is_empty() {
            if !model.fields.is_empty() {
                lines.push("".to_string());
            }
            lines.extend(constants);
        }
        lines.push("};".to_string());
        lines.push("".to_string());
    }

    for model in &ir.models {
        let name = &model.name;
        lines.push(format!("std::vector<uint8_t> serialize(const {}& data);", name));
        lines.push(format!("{} deserialize{}(const uint8_t* data, size_t size);", name, name));
        lines.push(format!("{} deserialize{}(const std::vector<uint8_t>& data);", name, name));
    }
    if !ir.models.is_empty() {
        lines.push("".to_string());
    }

    lines.push("namespace command_ids {".to_string());
    for (model, id) in ir.commands() {
        lines.push(format!(
            "constexpr uint8_t {} = {};",
            to_upper_snake_case(&model.name),
            hex_byte(id)
        ));
    }
    lines.push("} // namespace command_ids".to_string());
    lines.push("".to_string());

    lines.push(format!("}} // namespace {}", ns));
    lines.push("".to_string());
    lines.push("#endif // BINARY_PROTOCOL_HPP".to_string());
    lines.push("".to_string());

    lines.join("\n")
}

/// Models ordered so that every struct comes after the structs it embeds.
/// Layout has already rejected cycles.
fn struct_order(ir: &SchemaIR) -> Vec<&ModelDefinition> {
    fn visit<'a>(
        model: &'a ModelDefinition,
        ir: &'a SchemaIR,
        placed: &mut HashSet<&'a str>,
        order: &mut Vec<&'a ModelDefinition>,
    ) {
        if !placed.insert(model.name.as_str()) {
            return;
        }
        for field in &model.fields {
            if let Some(inner) = field.ty.model_name().and_then(|name| ir.find_model(name)) {
                visit(inner, ir, placed, order);
            }
        }
        order.push(model);
    }

    let mut placed = HashSet::new();
    let mut order = Vec::with_capacity(ir.models.len());
    for model in &ir.models {
        visit(model, ir, &mut placed, &mut order);
    }
    order
}

fn generate_source(ir: &SchemaIR, ns: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    banner(&mut lines, "Auto-generated binary protocol implementation", ir);

    lines.push("#include \"protocol.hpp\"".to_string());
    lines.push("".to_string());
    lines.push(format!("namespace {} {{", ns));
    lines.push("".to_string());
    lines.push(SOURCE_RUNTIME.to_string());

    for enum_def in &ir.enums {
        lines.push(generate_enum_decoder(enum_def));
    }
    for model in &ir.models {
        lines.push(generate_model_codec(model, ir));
    }

    lines.push(format!("}} // namespace {}", ns));
    lines.push("".to_string());

    lines.join("\n")
}

fn generate_enum_decoder(enum_def: &EnumDefinition) -> String {
    let name = &enum_def.name;
    let mut lines = Vec::new();
    lines.push(format!("{} decode{}(uint8_t value) {{", name, name));
    lines.push("    switch (value) {".to_string());
    for member in &enum_def.members {
        lines.push(format!("        case {}:", member.value));
    }
    if !enum_def.members.is_empty() {
        lines.push(format!("            return static_cast<{}>(value);", name));
    }
    lines.push("        default:".to_string());
    lines.push(format!("            throw EnumDecodeError(\"{}\", value);", name));
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.join("\n")
}

fn generate_model_codec(model: &ModelDefinition, ir: &SchemaIR) -> String {
    let name = &model.name;
    let mut lines = Vec::new();

    lines.push(format!("std::vector<uint8_t> serialize(const {}& data) {{", name));
    lines.push("    BinaryWriter writer;".to_string());
    for field in &model.fields {
        let value = format!("data.{}", escape_cpp_keyword(&field.name));
        lines.push(format!("    {}", write_statement(FieldCodec::of(field, ir), &value)));
    }
    lines.push("    return writer.data();".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("{} deserialize{}(const uint8_t* data, size_t size) {{", name, name));
    lines.push("    BinaryReader reader(data, size);".to_string());
    lines.push(format!("    {} result{{}};", name));
    for field in &model.fields {
        lines.push(format!(
            "    result.{} = {};",
            escape_cpp_keyword(&field.name),
            read_expression(FieldCodec::of(field, ir))
        ));
    }
    lines.push("    return result;".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("{} deserialize{}(const std::vector<uint8_t>& data) {{", name, name));
    lines.push(format!("    return deserialize{}(data.data(), data.size());", name));
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.join("\n")
}

fn write_statement(codec: FieldCodec, value: &str) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("writer.write{}({});", accessor(kind), value),
        FieldCodec::FixedString(n) => format!("writer.writeFixedString({}, {});", value, n),
        FieldCodec::FixedBytes(_) | FieldCodec::RemainingBytes => format!("writer.writeBytes({});", value),
        FieldCodec::PrefixedString(prefix) => format!(
            "writer.writeLengthPrefixedString({}, {});",
            value,
            prefix_width(prefix)
        ),
        FieldCodec::PrefixedBytes(prefix) => {
            format!("writer.writeLengthPrefixed({}, {});", value, prefix_width(prefix))
        }
        FieldCodec::RemainingString => format!("writer.writeString({});", value),
        FieldCodec::Enum(_) => format!("writer.writeUint8(static_cast<uint8_t>({}));", value),
        FieldCodec::Model { .. } => format!("writer.writeBytes(serialize({}));", value),
        FieldCodec::PrefixedModel { prefix, .. } => format!(
            "writer.writeLengthPrefixed(serialize({}), {});",
            value,
            prefix_width(prefix)
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "writer.writeLengthPrefixedItems({}, {}, [](BinaryWriter& w, const {}& item) {{ {} }});",
            value,
            prefix_width(prefix),
            element_type(element),
            write_element(element)
        ),
        FieldCodec::RemainingArray(element) => format!(
            "writer.writeItems({}, [](BinaryWriter& w, const {}& item) {{ {} }});",
            value,
            element_type(element),
            write_element(element)
        ),
    }
}

fn write_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("w.write{}(item);", accessor(kind)),
        ElementCodec::Enum(_) => "w.writeUint8(static_cast<uint8_t>(item));".to_string(),
        ElementCodec::Model { .. } => "w.writeBytes(serialize(item));".to_string(),
    }
}

fn read_expression(codec: FieldCodec) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("reader.read{}()", accessor(kind)),
        FieldCodec::FixedString(n) => format!("reader.readFixedString({})", n),
        FieldCodec::FixedBytes(n) => format!("reader.readFixedBytes<{}>()", n),
        FieldCodec::PrefixedString(prefix) => {
            format!("reader.readLengthPrefixedString({})", prefix_width(prefix))
        }
        FieldCodec::PrefixedBytes(prefix) => format!("reader.readLengthPrefixed({})", prefix_width(prefix)),
        FieldCodec::RemainingString => "reader.readRemainingString()".to_string(),
        FieldCodec::RemainingBytes => "reader.readRemaining()".to_string(),
        FieldCodec::Enum(name) => format!("decode{}(reader.readUint8())", name),
        FieldCodec::Model { name, size } => format!("deserialize{}(reader.readBytes({}))", name, size),
        FieldCodec::PrefixedModel { name, prefix } => format!(
            "deserialize{}(reader.readLengthPrefixed({}))",
            name,
            prefix_width(prefix)
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "reader.readLengthPrefixedItems<{}>({}, [](BinaryReader& r) {{ return {}; }})",
            element_type(element),
            prefix_width(prefix),
            read_element(element)
        ),
        FieldCodec::RemainingArray(element) => format!(
            "reader.readItems<{}>([](BinaryReader& r) {{ return {}; }})",
            element_type(element),
            read_element(element)
        ),
    }
}

fn read_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("r.read{}()", accessor(kind)),
        ElementCodec::Enum(name) => format!("decode{}(r.readUint8())", name),
        ElementCodec::Model { name, size } => format!("deserialize{}(r.readBytes({}))", name, size),
    }
}
