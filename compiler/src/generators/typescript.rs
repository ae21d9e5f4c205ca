use crate::{
    generators::{doc_lines, CodeGenerator, ElementCodec, FieldCodec, GeneratedFile, Language},
    types::{EnumDefinition, FieldDefinition, ModelDefinition, PrimitiveKind, SchemaIR},
    utils::hex_byte,
};

/// Emits `types.ts`, `serializer.ts` and an `index.ts` re-exporting both.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptGenerator;

impl CodeGenerator for TypeScriptGenerator {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn generate(&self, ir: &SchemaIR) -> Vec<GeneratedFile> {
        vec![
            GeneratedFile {
                filename: "types.ts".to_string(),
                content: generate_types(ir),
            },
            GeneratedFile {
                filename: "serializer.ts".to_string(),
                content: generate_serializer(ir),
            },
            GeneratedFile {
                filename: "index.ts".to_string(),
                content: "export * from './types.js';\nexport * from './serializer.js';\n".to_string(),
            },
        ]
    }
}

const RUNTIME: &str = r#"export type LengthPrefix = 'uint8' | 'uint16' | 'uint32' | 'uint64';

const PREFIX_MAX: Record<LengthPrefix, number> = {
    uint8: 0xFF,
    uint16: 0xFFFF,
    uint32: 0xFFFFFFFF,
    uint64: Number.MAX_SAFE_INTEGER,
};

export class BufferUnderflowError extends Error {
    constructor(public readonly needed: number, public readonly available: number) {
        super(`Buffer underflow: needed ${needed} bytes but only ${available} available`);
        this.name = 'BufferUnderflowError';
    }
}

export class EnumDecodeError extends Error {
    constructor(public readonly enumName: string, public readonly value: number) {
        super(`Invalid value ${value} for enum ${enumName}`);
        this.name = 'EnumDecodeError';
    }
}

export class LengthOverflowError extends Error {
    constructor(public readonly length: number, public readonly max: number) {
        super(`Length ${length} does not fit in a prefix with maximum ${max}`);
        this.name = 'LengthOverflowError';
    }
}

/**
 * Little-endian binary writer
 */
export class BinaryWriter {
    private buffer: number[] = [];

    writeUint8(value: number): void {
        this.buffer.push(value & 0xFF);
    }

    writeUint16(value: number): void {
        this.buffer.push(value & 0xFF);
        this.buffer.push((value >> 8) & 0xFF);
    }

    writeUint32(value: number): void {
        this.buffer.push(value & 0xFF);
        this.buffer.push((value >> 8) & 0xFF);
        this.buffer.push((value >> 16) & 0xFF);
        this.buffer.push((value >> 24) & 0xFF);
    }

    writeUint64(value: bigint): void {
        const v = BigInt.asUintN(64, value);
        for (let i = 0; i < 8; i++) {
            this.buffer.push(Number((v >> BigInt(i * 8)) & 0xFFn));
        }
    }

    writeInt8(value: number): void {
        this.writeUint8(value);
    }

    writeInt16(value: number): void {
        this.writeUint16(value);
    }

    writeInt32(value: number): void {
        this.writeUint32(value);
    }

    writeInt64(value: bigint): void {
        this.writeUint64(value);
    }

    writeFloat32(value: number): void {
        const view = new DataView(new ArrayBuffer(4));
        view.setFloat32(0, value, true);
        for (let i = 0; i < 4; i++) {
            this.buffer.push(view.getUint8(i));
        }
    }

    writeFloat64(value: number): void {
        const view = new DataView(new ArrayBuffer(8));
        view.setFloat64(0, value, true);
        for (let i = 0; i < 8; i++) {
            this.buffer.push(view.getUint8(i));
        }
    }

    writeBool(value: boolean): void {
        this.writeUint8(value ? 1 : 0);
    }

    writeFixedString(value: string, size: number): void {
        this.writeFixedBytes(new TextEncoder().encode(value), size);
    }

    writeFixedBytes(value: Uint8Array, size: number): void {
        for (let i = 0; i < size; i++) {
            this.buffer.push(i < value.length ? value[i] : 0);
        }
    }

    writeBytes(value: Uint8Array): void {
        for (let i = 0; i < value.length; i++) {
            this.buffer.push(value[i]);
        }
    }

    writeString(value: string): void {
        this.writeBytes(new TextEncoder().encode(value));
    }

    writeLengthPrefixed(value: Uint8Array, prefix: LengthPrefix): void {
        if (value.length > PREFIX_MAX[prefix]) {
            throw new LengthOverflowError(value.length, PREFIX_MAX[prefix]);
        }
        switch (prefix) {
            case 'uint8':
                this.writeUint8(value.length);
                break;
            case 'uint16':
                this.writeUint16(value.length);
                break;
            case 'uint32':
                this.writeUint32(value.length);
                break;
            case 'uint64':
                this.writeUint64(BigInt(value.length));
                break;
        }
        this.writeBytes(value);
    }

    writeLengthPrefixedString(value: string, prefix: LengthPrefix): void {
        this.writeLengthPrefixed(new TextEncoder().encode(value), prefix);
    }

    writeItems<T>(items: T[], writeItem: (writer: BinaryWriter, item: T) => void): void {
        for (const item of items) {
            writeItem(this, item);
        }
    }

    writeLengthPrefixedItems<T>(
        items: T[],
        prefix: LengthPrefix,
        writeItem: (writer: BinaryWriter, item: T) => void,
    ): void {
        const scratch = new BinaryWriter();
        scratch.writeItems(items, writeItem);
        this.writeLengthPrefixed(scratch.toUint8Array(), prefix);
    }

    toUint8Array(): Uint8Array {
        return new Uint8Array(this.buffer);
    }

    get length(): number {
        return this.buffer.length;
    }
}

/**
 * Little-endian binary reader. Reads past the end throw BufferUnderflowError.
 */
export class BinaryReader {
    private bytes: Uint8Array;
    private view: DataView;
    private offset: number = 0;

    constructor(buffer: Uint8Array) {
        this.bytes = buffer;
        this.view = new DataView(buffer.buffer, buffer.byteOffset, buffer.byteLength);
    }

    private ensure(size: number): void {
        if (size > this.remaining) {
            throw new BufferUnderflowError(size, this.remaining);
        }
    }

    readUint8(): number {
        this.ensure(1);
        const value = this.view.getUint8(this.offset);
        this.offset += 1;
        return value;
    }

    readUint16(): number {
        this.ensure(2);
        const value = this.view.getUint16(this.offset, true);
        this.offset += 2;
        return value;
    }

    readUint32(): number {
        this.ensure(4);
        const value = this.view.getUint32(this.offset, true);
        this.offset += 4;
        return value;
    }

    readUint64(): bigint {
        this.ensure(8);
        const value = this.view.getBigUint64(this.offset, true);
        this.offset += 8;
        return value;
    }

    readInt8(): number {
        this.ensure(1);
        const value = this.view.getInt8(this.offset);
        this.offset += 1;
        return value;
    }

    readInt16(): number {
        this.ensure(2);
        const value = this.view.getInt16(this.offset, true);
        this.offset += 2;
        return value;
    }

    readInt32(): number {
        this.ensure(4);
        const value = this.view.getInt32(this.offset, true);
        this.offset += 4;
        return value;
    }

    readInt64(): bigint {
        this.ensure(8);
        const value = this.view.getBigInt64(this.offset, true);
        this.offset += 8;
        return value;
    }

    readFloat32(): number {
        this.ensure(4);
        const value = this.view.getFloat32(this.offset, true);
        this.offset += 4;
        return value;
    }

    readFloat64(): number {
        this.ensure(8);
        const value = this.view.getFloat64(this.offset, true);
        this.offset += 8;
        return value;
    }

    readBool(): boolean {
        return this.readUint8() !== 0;
    }

    readFixedString(size: number): string {
        const bytes = this.readBytes(size);
        let end = bytes.indexOf(0);
        if (end === -1) end = size;
        return new TextDecoder().decode(bytes.subarray(0, end));
    }

    readBytes(length: number): Uint8Array {
        this.ensure(length);
        const bytes = this.bytes.slice(this.offset, this.offset + length);
        this.offset += length;
        return bytes;
    }

    readRemaining(): Uint8Array {
        return this.readBytes(this.remaining);
    }

    readRemainingString(): string {
        return new TextDecoder().decode(this.readRemaining());
    }

    readLengthPrefixed(prefix: LengthPrefix): Uint8Array {
        let length: number;
        switch (prefix) {
            case 'uint8':
                length = this.readUint8();
                break;
            case 'uint16':
                length = this.readUint16();
                break;
            case 'uint32':
                length = this.readUint32();
                break;
            case 'uint64':
                length = Number(this.readUint64());
                break;
        }
        return this.readBytes(length);
    }

    readLengthPrefixedString(prefix: LengthPrefix): string {
        return new TextDecoder().decode(this.readLengthPrefixed(prefix));
    }

    readItems<T>(readItem: (reader: BinaryReader) => T): T[] {
        const items: T[] = [];
        while (this.remaining > 0) {
            const start = this.offset;
            items.push(readItem(this));
            if (this.offset === start) {
                throw new Error(`Array item consumed no bytes with ${this.remaining} bytes left`);
            }
        }
        return items;
    }

    readLengthPrefixedItems<T>(prefix: LengthPrefix, readItem: (reader: BinaryReader) => T): T[] {
        return new BinaryReader(this.readLengthPrefixed(prefix)).readItems(readItem);
    }

    get position(): number {
        return this.offset;
    }

    get remaining(): number {
        return this.view.byteLength - this.offset;
    }
}
"#;

fn push_doc(lines: &mut Vec<String>, doc: &Option<String>, indent: &str) {
    let doc = doc_lines(doc);
    match doc.as_slice() {
        [] => {}
        [line] => lines.push(format!("{}/** {} */", indent, line)),
        _ => {
            lines.push(format!("{}/**", indent));
            for line in doc {
                lines.push(format!("{} * {}", indent, line).trim_end().to_string());
            }
            lines.push(format!("{} */", indent));
        }
    }
}

fn scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Uint64 | PrimitiveKind::Int64 => "bigint",
        PrimitiveKind::Bool => "boolean",
        PrimitiveKind::String => "string",
        PrimitiveKind::Bytes => "Uint8Array",
        _ => "number",
    }
}

/// `Uint16` in `writeUint16` / `readUint16`.
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

fn prefix_literal(kind: PrimitiveKind) -> String {
    format!("'{}'", kind.name())
}

/// Type expression for a field. `qualifier` is `"Types."` inside serializer.ts.
fn field_type(field: &FieldDefinition, ir: &SchemaIR, qualifier: &str) -> String {
    match FieldCodec::of(field, ir) {
        FieldCodec::Scalar(kind) => scalar_type(kind).to_string(),
        FieldCodec::FixedString(_) | FieldCodec::PrefixedString(_) | FieldCodec::RemainingString => {
            "string".to_string()
        }
        FieldCodec::FixedBytes(_) | FieldCodec::PrefixedBytes(_) | FieldCodec::RemainingBytes => {
            "Uint8Array".to_string()
        }
        FieldCodec::Enum(name) | FieldCodec::Model { name, .. } | FieldCodec::PrefixedModel { name, .. } => {
            format!("{}{}", qualifier, name)
        }
        FieldCodec::PrefixedArray { element, .. } | FieldCodec::RemainingArray(element) => match element {
            ElementCodec::Scalar(kind) => format!("{}[]", scalar_type(kind)),
            ElementCodec::Enum(name) | ElementCodec::Model { name, .. } => format!("{}{}[]", qualifier, name),
        },
    }
}

fn generate_types(ir: &SchemaIR) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("/**".to_string());
    lines.push(" * Auto-generated binary protocol types".to_string());
    lines.push(format!(" * Generated from: {}", ir.metadata.source_file));
    lines.push(format!(" * Generated at: {} (unix time)", ir.metadata.parsed_at));
    if let Some(version) = &ir.metadata.protocol_version {
        lines.push(format!(" * Protocol version: {}", version));
    }
    lines.push(" */".to_string());
    lines.push("".to_string());

    for enum_def in &ir.enums {
        push_doc(&mut lines, &enum_def.doc, "");
        lines.push(format!("export enum {} {{", enum_def.name));
        for member in &enum_def.members {
            push_doc(&mut lines, &member.doc, "    ");
            lines.push(format!("    {} = {},", member.name, member.value));
        }
        lines.push("}".to_string());
        lines.push("".to_string());
    }

    for model in &ir.models {
        push_doc(&mut lines, &model.doc, "");
        lines.push(format!("export interface {} {{", model.name));
        for field in &model.fields {
            push_doc(&mut lines, &field.doc, "    ");
            lines.push(format!("    {}: {};", field.name, field_type(field, ir, "")));
        }
        lines.push("}".to_string());
        if let Some(size) = model.fixed_size() {
            lines.push(format!("// Fixed size: {} bytes", size));
        }
        if let Some(id) = model.command_id {
            lines.push(format!("// Command ID: {}", hex_byte(id)));
        }
        lines.push("".to_string());
    }

    lines.push("/**".to_string());
    lines.push(" * Command ID to type mapping".to_string());
    lines.push(" */".to_string());
    lines.push("export const CommandIds = {".to_string());
    for (model, id) in ir.commands() {
        lines.push(format!("    {}: {},", model.name, hex_byte(id)));
    }
    lines.push("} as const;".to_string());
    lines.push("".to_string());
    lines.push("export type CommandId = typeof CommandIds[keyof typeof CommandIds];".to_string());
    lines.push("".to_string());

    lines.join("\n")
}

fn generate_serializer(ir: &SchemaIR) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("/**".to_string());
    lines.push(" * Auto-generated binary serializer/deserializer".to_string());
    lines.push(" */".to_string());
    lines.push("".to_string());
    lines.push("import * as Types from './types.js';".to_string());
    lines.push("".to_string());
    lines.push(RUNTIME.to_string());

    for enum_def in &ir.enums {
        lines.push(generate_enum_decoder(enum_def));
    }
    for model in &ir.models {
        lines.push(generate_model_codec(model, ir));
    }

    lines.join("\n")
}

fn generate_enum_decoder(enum_def: &EnumDefinition) -> String {
    let name = &enum_def.name;
    let mut lines = Vec::new();
    lines.push("/**".to_string());
    lines.push(format!(" * Decode a byte into {}", name));
    lines.push(" */".to_string());
    lines.push(format!("export function decode{}(value: number): Types.{} {{", name, name));
    lines.push("    switch (value) {".to_string());
    for member in &enum_def.members {
        lines.push(format!("        case {}:", member.value));
    }
    if !enum_def.members.is_empty() {
        lines.push(format!("            return value as Types.{};", name));
    }
    lines.push("        default:".to_string());
    lines.push(format!("            throw new EnumDecodeError('{}', value);", name));
    lines.push("    }".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.join("\n")
}

fn generate_model_codec(model: &ModelDefinition, ir: &SchemaIR) -> String {
    let name = &model.name;
    let mut lines = Vec::new();

    lines.push("/**".to_string());
    lines.push(format!(" * Serialize {} to binary", name));
    lines.push(" */".to_string());
    lines.push(format!(
        "export function serialize{}(data: Types.{}): Uint8Array {{",
        name, name
    ));
    lines.push("    const writer = new BinaryWriter();".to_string());
    for field in &model.fields {
        let value = format!("data.{}", field.name);
        lines.push(format!("    {}", write_statement(FieldCodec::of(field, ir), &value)));
    }
    lines.push("    return writer.toUint8Array();".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push("/**".to_string());
    lines.push(format!(" * Deserialize {} from binary", name));
    lines.push(" */".to_string());
    lines.push(format!(
        "export function deserialize{}(buffer: Uint8Array): Types.{} {{",
        name, name
    ));
    lines.push("    const reader = new BinaryReader(buffer);".to_string());
    lines.push("    return {".to_string());
    for field in &model.fields {
        lines.push(format!(
            "        {}: {},",
            field.name,
            read_expression(FieldCodec::of(field, ir))
        ));
    }
    lines.push("    };".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.join("\n")
}

fn write_statement(codec: FieldCodec, value: &str) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("writer.write{}({});", accessor(kind), value),
        FieldCodec::FixedString(n) => format!("writer.writeFixedString({}, {});", value, n),
        FieldCodec::FixedBytes(n) => format!("writer.writeFixedBytes({}, {});", value, n),
        FieldCodec::PrefixedString(prefix) => format!(
            "writer.writeLengthPrefixedString({}, {});",
            value,
            prefix_literal(prefix)
        ),
        FieldCodec::PrefixedBytes(prefix) => {
            format!("writer.writeLengthPrefixed({}, {});", value, prefix_literal(prefix))
        }
        FieldCodec::RemainingString => format!("writer.writeString({});", value),
        FieldCodec::RemainingBytes => format!("writer.writeBytes({});", value),
        FieldCodec::Enum(_) => format!("writer.writeUint8({});", value),
        FieldCodec::Model { name, .. } => format!("writer.writeBytes(serialize{}({}));", name, value),
        FieldCodec::PrefixedModel { name, prefix } => format!(
            "writer.writeLengthPrefixed(serialize{}({}), {});",
            name,
            value,
            prefix_literal(prefix)
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "writer.writeLengthPrefixedItems({}, {}, (w, item) => {});",
            value,
            prefix_literal(prefix),
            write_element(element)
        ),
        FieldCodec::RemainingArray(element) => {
            format!("writer.writeItems({}, (w, item) => {});", value, write_element(element))
        }
    }
}

fn write_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("w.write{}(item)", accessor(kind)),
        ElementCodec::Enum(_) => "w.writeUint8(item)".to_string(),
        ElementCodec::Model { name, .. } => format!("w.writeBytes(serialize{}(item))", name),
    }
}

fn read_expression(codec: FieldCodec) -> String {
    match codec {
        FieldCodec::Scalar(kind) => format!("reader.read{}()", accessor(kind)),
        FieldCodec::FixedString(n) => format!("reader.readFixedString({})", n),
        FieldCodec::FixedBytes(n) => format!("reader.readBytes({})", n),
        FieldCodec::PrefixedString(prefix) => {
            format!("reader.readLengthPrefixedString({})", prefix_literal(prefix))
        }
        FieldCodec::PrefixedBytes(prefix) => format!("reader.readLengthPrefixed({})", prefix_literal(prefix)),
        FieldCodec::RemainingString => "reader.readRemainingString()".to_string(),
        FieldCodec::RemainingBytes => "reader.readRemaining()".to_string(),
        FieldCodec::Enum(name) => format!("decode{}(reader.readUint8())", name),
        FieldCodec::Model { name, size } => format!("deserialize{}(reader.readBytes({}))", name, size),
        FieldCodec::PrefixedModel { name, prefix } => format!(
            "deserialize{}(reader.readLengthPrefixed({}))",
            name,
            prefix_literal(prefix)
        ),
        FieldCodec::PrefixedArray { element, prefix } => format!(
            "reader.readLengthPrefixedItems({}, (r) => {})",
            prefix_literal(prefix),
            read_element(element)
        ),
        FieldCodec::RemainingArray(element) => format!("reader.readItems((r) => {})", read_element(element)),
    }
}

fn read_element(element: ElementCodec) -> String {
    match element {
        ElementCodec::Scalar(kind) => format!("r.read{}()", accessor(kind)),
        ElementCodec::Enum(name) => format!("decode{}(r.readUint8())", name),
        ElementCodec::Model { name, size } => format!("deserialize{}(r.readBytes({}))", name, size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse;

    fn generate(text: &str) -> Vec<GeneratedFile> {
        let ir = parse(text, "test.tsp").unwrap();
        TypeScriptGenerator.generate(&ir)
    }

    fn file<'a>(files: &'a [GeneratedFile], name: &str) -> &'a str {
        &files.iter().find(|f| f.filename == name).unwrap().content
    }

    #[test]
    fn test_output_files() {
        let files = generate("model A { x: uint8; }");
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["types.ts", "serializer.ts", "index.ts"]);
        assert!(file(&files, "index.ts").contains("export * from './serializer.js';"));
    }

    #[test]
    fn test_types_file() {
        let files = generate(
            "/** Device state */ enum DeviceStatus { Offline, Online } \
             @command_id(0x01) model PingCommand { timestamp: uint64; } \
             model Info { status: DeviceStatus; @size(32) device_name: string; \
                          @length_prefix(uint16) data: bytes; readings: int16[]; }",
        );
        let types = file(&files, "types.ts");
        assert!(types.contains("/** Device state */\nexport enum DeviceStatus {\n    Offline = 0,\n    Online = 1,\n}"));
        assert!(types.contains("export interface PingCommand {\n    timestamp: bigint;\n}\n// Fixed size: 8 bytes\n// Command ID: 0x01"));
        assert!(types.contains("    status: DeviceStatus;"));
        assert!(types.contains("    device_name: string;"));
        assert!(types.contains("    data: Uint8Array;"));
        assert!(types.contains("    readings: number[];"));
        assert!(types.contains("export const CommandIds = {\n    PingCommand: 0x01,\n} as const;"));
    }

    #[test]
    fn test_serializer_runtime_and_decoders() {
        let files = generate("enum E { A, @value(255) B } model M { e: E; }");
        let ser = file(&files, "serializer.ts");
        assert!(ser.contains("import * as Types from './types.js';"));
        assert!(ser.contains("export class BinaryWriter {"));
        assert!(ser.contains("export class BinaryReader {"));
        assert!(ser.contains("throw new BufferUnderflowError(size, this.remaining);"));
        assert!(ser.contains("export function decodeE(value: number): Types.E {"));
        assert!(ser.contains("        case 0:\n        case 255:\n            return value as Types.E;"));
        assert!(ser.contains("throw new EnumDecodeError('E', value);"));
        assert!(ser.contains("    writer.writeUint8(data.e);"));
        assert!(ser.contains("        e: decodeE(reader.readUint8()),"));
    }

    #[test]
    fn test_model_codecs() {
        let files = generate(
            "model V { x: float32; y: float32; z: float32; } \
             model S { id: uint8; position: V; @size(16) fw: string; @size(4) raw: bytes; \
                       @length_prefix(uint8) label: string; @length_prefix(uint16) vs: V[]; tail: uint32[]; }",
        );
        let ser = file(&files, "serializer.ts");
        assert!(ser.contains("export function serializeS(data: Types.S): Uint8Array {"));
        assert!(ser.contains("    writer.writeBytes(serializeV(data.position));"));
        assert!(ser.contains("    writer.writeFixedString(data.fw, 16);"));
        assert!(ser.contains("    writer.writeFixedBytes(data.raw, 4);"));
        assert!(ser.contains("    writer.writeLengthPrefixedString(data.label, 'uint8');"));
        assert!(ser.contains("    writer.writeLengthPrefixedItems(data.vs, 'uint16', (w, item) => w.writeBytes(serializeV(item)));"));
        assert!(ser.contains("    writer.writeItems(data.tail, (w, item) => w.writeUint32(item));"));
        assert!(ser.contains("        position: deserializeV(reader.readBytes(12)),"));
        assert!(ser.contains("        fw: reader.readFixedString(16),"));
        assert!(ser.contains("        vs: reader.readLengthPrefixedItems('uint16', (r) => deserializeV(r.readBytes(12))),"));
        assert!(ser.contains("        tail: reader.readItems((r) => r.readUint32()),"));
    }
}
