use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
    Bytes,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 13] = [
        PrimitiveKind::Uint8,
        PrimitiveKind::Uint16,
        PrimitiveKind::Uint32,
        PrimitiveKind::Uint64,
        PrimitiveKind::Int8,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Float32,
        PrimitiveKind::Float64,
        PrimitiveKind::Bool,
        PrimitiveKind::String,
        PrimitiveKind::Bytes,
    ];

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Uint8 => "uint8",
            PrimitiveKind::Uint16 => "uint16",
            PrimitiveKind::Uint32 => "uint32",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    /// Natural wire width. `string` and `bytes` have none.
    pub fn natural_size(self) -> Option<usize> {
        match self {
            PrimitiveKind::Uint8 | PrimitiveKind::Int8 | PrimitiveKind::Bool => Some(1),
            PrimitiveKind::Uint16 | PrimitiveKind::Int16 => Some(2),
            PrimitiveKind::Uint32 | PrimitiveKind::Int32 | PrimitiveKind::Float32 => Some(4),
            PrimitiveKind::Uint64 | PrimitiveKind::Int64 | PrimitiveKind::Float64 => Some(8),
            PrimitiveKind::String | PrimitiveKind::Bytes => None,
        }
    }

    /// True for the unsigned kinds usable as a length prefix.
    pub fn is_length_prefix(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Uint8 | PrimitiveKind::Uint16 | PrimitiveKind::Uint32 | PrimitiveKind::Uint64
        )
    }

    pub fn is_scalar(self) -> bool {
        self.natural_size().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum TypeInfo {
    Primitive(PrimitiveKind),
    Enum(String),
    Model(String),
    Array(Box<TypeInfo>),
}

impl TypeInfo {
    /// Resolves a written type name. Anything that is not a primitive is
    /// tagged as a model until the verifier sees the enums.
    pub fn from_name(name: &str) -> TypeInfo {
        match PrimitiveKind::from_name(name) {
            Some(kind) => TypeInfo::Primitive(kind),
            None => TypeInfo::Model(name.to_string()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            TypeInfo::Primitive(kind) => kind.name().to_string(),
            TypeInfo::Enum(name) | TypeInfo::Model(name) => name.clone(),
            TypeInfo::Array(element) => format!("{}[]", element.name()),
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeInfo::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeInfo::Array(_))
    }

    /// The model this type embeds, looking through arrays.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            TypeInfo::Model(name) => Some(name.as_str()),
            TypeInfo::Array(element) => element.model_name(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeInfo {
    pub fixed_size:    Option<usize>,
    pub length_prefix: Option<PrimitiveKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecoratorArg {
    Number(f64),
    String(String),
    Bool(bool),
}

impl DecoratorArg {
    /// The argument as a non-negative whole number, if it is one.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            DecoratorArg::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 => {
                Some(*n as u64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecoratorArg::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decorator {
    pub name:   String,
    pub args:   Vec<DecoratorArg>,
    pub line:   usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name:       String,
    #[serde(rename = "type")]
    pub ty:         TypeInfo,
    pub size:       SizeInfo,
    pub decorators: Vec<Decorator>,
    pub doc:        Option<String>,
    pub offset:     Option<usize>,
    pub line:       usize,
    pub column:     usize,
}

impl FieldDefinition {
    /// An array, `string` or `bytes` field with neither `@size` nor
    /// `@length_prefix`. It takes the rest of the buffer.
    pub fn is_unbounded(&self) -> bool {
        if self.size.length_prefix.is_some() {
            return false;
        }
        match &self.ty {
            TypeInfo::Array(_) => true,
            TypeInfo::Primitive(PrimitiveKind::String | PrimitiveKind::Bytes) => {
                self.size.fixed_size.is_none()
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name:  String,
    pub value: u8,
    pub doc:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDefinition {
    pub name:       String,
    pub members:    Vec<EnumMember>,
    pub base_type:  PrimitiveKind,
    pub decorators: Vec<Decorator>,
    pub doc:        Option<String>,
    pub line:       usize,
    pub column:     usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "bytes", rename_all = "lowercase")]
pub enum WireSize {
    Fixed(usize),
    Variable,
}

impl WireSize {
    pub fn fixed(self) -> Option<usize> {
        match self {
            WireSize::Fixed(n) => Some(n),
            WireSize::Variable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDefinition {
    pub name:       String,
    pub fields:     Vec<FieldDefinition>,
    pub decorators: Vec<Decorator>,
    pub doc:        Option<String>,
    pub command_id: Option<u8>,
    pub wire_size:  WireSize,
    pub line:       usize,
    pub column:     usize,
}

impl ModelDefinition {
    pub fn fixed_size(&self) -> Option<usize> {
        self.wire_size.fixed()
    }

    pub fn has_variable_length(&self) -> bool {
        self.wire_size == WireSize::Variable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaMetadata {
    pub source_file:      String,
    /// Seconds since the Unix epoch.
    pub parsed_at:        u64,
    pub protocol_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaIR {
    pub namespace: String,
    pub enums:     Vec<EnumDefinition>,
    pub models:    Vec<ModelDefinition>,
    pub metadata:  SchemaMetadata,
}

impl SchemaIR {
    pub fn find_enum(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Models carrying a `@command_id`, in declaration order.
    pub fn commands(&self) -> impl Iterator<Item = (&ModelDefinition, u8)> {
        self.models
            .iter()
            .filter_map(|m| m.command_id.map(|id| (m, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("uint128"), None);
    }

    #[test]
    fn test_natural_sizes() {
        assert_eq!(PrimitiveKind::Bool.natural_size(), Some(1));
        assert_eq!(PrimitiveKind::Int16.natural_size(), Some(2));
        assert_eq!(PrimitiveKind::Float32.natural_size(), Some(4));
        assert_eq!(PrimitiveKind::Uint64.natural_size(), Some(8));
        assert_eq!(PrimitiveKind::String.natural_size(), None);
        assert_eq!(PrimitiveKind::Bytes.natural_size(), None);
    }

    #[test]
    fn test_type_info_serializes_with_kind_tag() {
        let ty = TypeInfo::Array(Box::new(TypeInfo::Primitive(PrimitiveKind::Float32)));
        assert_eq!(ty.name(), "float32[]");
        assert_eq!(
            serde_json::to_string(&ty).unwrap(),
            r#"{"kind":"array","name":{"kind":"primitive","name":"float32"}}"#
        );
    }

    #[test]
    fn test_decorator_arg_as_int() {
        assert_eq!(DecoratorArg::Number(129.0).as_int(), Some(129));
        assert_eq!(DecoratorArg::Number(1.5).as_int(), None);
        assert_eq!(DecoratorArg::Number(-1.0).as_int(), None);
        assert_eq!(DecoratorArg::String("1".into()).as_int(), None);
    }
}
