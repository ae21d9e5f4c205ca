use crate::error::TbsError;

/// JSON-style quoting for names in diagnostics.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> TbsError {
    TbsError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Converts a string to snake_case.
/// Consecutive uppercase letters stay together, so acronyms remain intact
/// (e.g. "sessionID" becomes "session_id", "HTTPServer" becomes "http_server").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if (!prev.is_uppercase() && prev != '_')
                    || (prev.is_uppercase() && i + 1 < chars.len() && chars[i + 1].is_lowercase())
                {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

pub fn to_upper_snake_case(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
pub fn escape_rust_keyword(s: &str) -> String {
    const KEYWORDS: [&str; 38] = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn",
        "else", "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut", "pub",
        "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while",
    ];
    if KEYWORDS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Field name as it appears in generated Rust structs.
pub fn rust_field_name(name: &str) -> String {
    escape_rust_keyword(&to_snake_case(name))
}

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char16_t", "char32_t", "class", "compl", "const", "constexpr",
    "const_cast", "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "return", "short", "signed", "sizeof", "static", "static_assert",
    "static_cast", "struct", "switch", "template", "this", "thread_local", "throw", "true",
    "try", "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual", "void",
    "volatile", "wchar_t", "while", "xor", "xor_eq",
];

/// Members every generated C++ struct may declare next to its fields.
const CPP_STRUCT_MEMBERS: &[&str] = &["COMMAND_ID", "FIXED_SIZE"];

/// Escapes C++ keywords and generated struct members by suffixing with an
/// underscore.
pub fn escape_cpp_keyword(s: &str) -> String {
    if CPP_KEYWORDS.contains(&s) || CPP_STRUCT_MEMBERS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Words TypeScript rejects as an interface or enum name.
const TS_RESERVED_TYPE_NAMES: &[&str] = &[
    "any", "bigint", "boolean", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "export", "extends", "false",
    "finally", "for", "function", "if", "implements", "import", "in", "instanceof",
    "interface", "let", "never", "new", "null", "number", "object", "package", "private",
    "protected", "public", "return", "static", "string", "super", "switch", "symbol", "this",
    "throw", "true", "try", "typeof", "undefined", "unknown", "var", "void", "while", "with",
    "yield",
];

/// Whether `name` cannot be used verbatim as a type in some generated language.
pub fn is_reserved_type_name(name: &str) -> bool {
    escape_rust_keyword(name) != name
        || CPP_KEYWORDS.contains(&name)
        || TS_RESERVED_TYPE_NAMES.contains(&name)
}

/// Formats a command id the way every backend prints it, e.g. `0x0A`.
pub fn hex_byte(value: u8) -> String {
    format!("0x{:02X}", value)
}
