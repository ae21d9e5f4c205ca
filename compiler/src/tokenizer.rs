use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::TbsError;
use crate::utils::error;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(?xs)
          (?P<ws>\s+)
        | (?P<doc_line>///[^\n]*)
        | (?P<line_comment>//[^\n]*)
        | (?P<doc_block>/\*\*[^/].*?(?:\*/|\z))
        | (?P<block_comment>/\*.*?(?:\*/|\z))
        | (?P<string>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')
        | (?P<unterminated>["'])
        | (?P<number>0[xX][0-9A-Fa-f]*|[0-9]+(?:\.[0-9]+)?)
        | (?P<ident>[A-Za-z_][A-Za-z0-9_]*)
        | (?P<punct>[{}()\[\]:;,@?.])
        | (?P<other>.)
        "#
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Namespace,
    Model,
    Enum,
    Identifier,
    Number,
    String,
    DocComment,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Colon,
    Semicolon,
    Comma,
    At,
    Question,
    Dot,
    Eof,
}

impl TokenKind {
    fn keyword_or_identifier(text: &str) -> TokenKind {
        match text {
            "namespace" => TokenKind::Namespace,
            "model" => TokenKind::Model,
            "enum" => TokenKind::Enum,
            _ => TokenKind::Identifier,
        }
    }

    fn punctuation(c: char) -> TokenKind {
        match c {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '@' => TokenKind::At,
            '?' => TokenKind::Question,
            _ => TokenKind::Dot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind:   TokenKind,
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits schema text into tokens. Comments and whitespace are dropped, doc
/// comments are kept, and the result always ends with an `Eof` token.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, TbsError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;

    for caps in TOKEN_REGEX.captures_iter(text) {
        let part = caps.get(0).map_or("", |m| m.as_str());

        if caps.name("unterminated").is_some() {
            return Err(error("unterminated string literal", line, column));
        }

        if let Some((kind, value)) = classify(&caps, part) {
            tokens.push(Token {
                kind,
                text: value,
                line,
                column,
            });
        }

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }
    }

    // Append EOF token
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

fn classify(caps: &Captures, part: &str) -> Option<(TokenKind, String)> {
    if caps.name("doc_line").is_some() {
        Some((TokenKind::DocComment, part[3..].trim().to_string()))
    } else if caps.name("doc_block").is_some() {
        Some((TokenKind::DocComment, block_doc_text(part)))
    } else if caps.name("string").is_some() {
        Some((TokenKind::String, unescape(&part[1..part.len() - 1])))
    } else if caps.name("number").is_some() {
        Some((TokenKind::Number, part.to_string()))
    } else if caps.name("ident").is_some() {
        Some((TokenKind::keyword_or_identifier(part), part.to_string()))
    } else if caps.name("punct").is_some() {
        let c = part.chars().next()?;
        Some((TokenKind::punctuation(c), part.to_string()))
    } else {
        None
    }
}

fn block_doc_text(part: &str) -> String {
    let inner = part.strip_prefix("/**").unwrap_or(part);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|l| {
            let l = l.trim();
            l.strip_prefix('*').map_or(l, str::trim_start)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize_schema(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let input = "model Ping { ts: uint64; }";
        let expected = vec![
            Token { kind: TokenKind::Model,      text: "model".into(),  line: 1, column: 1 },
            Token { kind: TokenKind::Identifier, text: "Ping".into(),   line: 1, column: 7 },
            Token { kind: TokenKind::LeftBrace,  text: "{".into(),      line: 1, column: 12 },
            Token { kind: TokenKind::Identifier, text: "ts".into(),     line: 1, column: 14 },
            Token { kind: TokenKind::Colon,      text: ":".into(),      line: 1, column: 16 },
            Token { kind: TokenKind::Identifier, text: "uint64".into(), line: 1, column: 18 },
            Token { kind: TokenKind::Semicolon,  text: ";".into(),      line: 1, column: 24 },
            Token { kind: TokenKind::RightBrace, text: "}".into(),      line: 1, column: 26 },
            Token { kind: TokenKind::Eof,        text: "".into(),       line: 1, column: 27 },
        ];
        let got = tokenize_schema(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_tracks_lines() {
        let got = tokenize_schema("enum A {\n  X,\n}").unwrap();
        let x = &got[3];
        assert_eq!((x.text.as_str(), x.line, x.column), ("X", 2, 3));
        let eof = got.last().unwrap();
        assert_eq!((eof.line, eof.column), (3, 2));
    }

    #[test]
    fn test_tokenize_namespace_dots() {
        assert_eq!(
            kinds("namespace a.b;"),
            vec![
                TokenKind::Namespace,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_comments() {
        let got = tokenize_schema("// plain\n/// doc line\n/* block */ /** Block\n * doc\n */ x").unwrap();
        let texts: Vec<_> = got.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            texts,
            vec![
                (TokenKind::DocComment, "doc line"),
                (TokenKind::DocComment, "Block\ndoc"),
                (TokenKind::Identifier, "x"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        let got = tokenize_schema("0x81 42 1.5").unwrap();
        let texts: Vec<_> = got.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["0x81", "42", "1.5", ""]);
        assert!(got[..3].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_tokenize_strings() {
        let got = tokenize_schema(r#""a\"b\n" 'c\'d' "\q""#).unwrap();
        assert_eq!(got[0].text, "a\"b\n");
        assert_eq!(got[1].text, "c'd");
        assert_eq!(got[2].text, "q");
        assert!(got[..3].iter().all(|t| t.kind == TokenKind::String));
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize_schema("x \"abc").unwrap_err();
        assert!(
            matches!(err, TbsError::ParseError { line: 1, column: 3, .. }),
            "expected a ParseError but got {:?}",
            err
        );
    }

    #[test]
    fn test_tokenize_skips_unknown_characters() {
        assert_eq!(
            kinds("a # $ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_tokenize_punctuation() {
        assert_eq!(
            kinds("{}()[]:;,@?."),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::At,
                TokenKind::Question,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }
}
