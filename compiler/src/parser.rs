use crate::{
    decorators::{self, validate_decorators, DecoratorTarget},
    error::TbsError,
    tokenizer::{Token, TokenKind},
    types::{
        Decorator, DecoratorArg, EnumDefinition, EnumMember, FieldDefinition, ModelDefinition,
        PrimitiveKind, SchemaIR, SchemaMetadata, SizeInfo, TypeInfo, WireSize,
    },
    utils::{error, quote},
};

/// Recursive-descent parser over a token stream ending in `Eof`.
struct Parser<'a> {
    tokens:      &'a [Token],
    index:       usize,
    pending_doc: Option<String>,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        // The stream always ends with Eof, which is never consumed.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token, TbsError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let tok = self.current();
        let found = if tok.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            quote(&tok.text)
        };
        Err(error(
            &format!("Expected {} but found {}", expected, found),
            tok.line,
            tok.column,
        ))
    }

    fn take_doc(&mut self) -> Option<String> {
        self.pending_doc.take()
    }

    fn parse_schema(&mut self, ir: &mut SchemaIR) -> Result<(), TbsError> {
        while !self.check(TokenKind::Eof) {
            let mut doc = self.pending_doc.take();
            let decorators = self.parse_decorators(&mut doc)?;
            self.pending_doc = doc;

            match self.current().kind {
                TokenKind::Namespace => {
                    validate_decorators(&decorators, DecoratorTarget::Namespace)?;
                    ir.namespace = self.parse_namespace()?;
                    self.pending_doc = None;
                }
                TokenKind::Enum => {
                    validate_decorators(&decorators, DecoratorTarget::Enum)?;
                    let doc = self.take_doc();
                    let mut enum_def = self.parse_enum(decorators)?;
                    enum_def.doc = doc;
                    ir.enums.push(enum_def);
                }
                TokenKind::Model => {
                    validate_decorators(&decorators, DecoratorTarget::Model)?;
                    let doc = self.take_doc();
                    let mut model_def = self.parse_model(decorators)?;
                    model_def.doc = doc;
                    ir.models.push(model_def);
                }
                _ => {
                    // Anything else at the top level is skipped.
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Collects a run of decorators. Doc comments may sit anywhere in the
    /// run and the last one wins.
    fn parse_decorators(&mut self, doc: &mut Option<String>) -> Result<Vec<Decorator>, TbsError> {
        let mut decorators = Vec::new();
        loop {
            if self.check(TokenKind::DocComment) {
                *doc = Some(self.advance().text.clone());
            } else if self.check(TokenKind::At) {
                decorators.push(self.parse_decorator()?);
            } else {
                break;
            }
        }
        Ok(decorators)
    }

    fn parse_decorator(&mut self) -> Result<Decorator, TbsError> {
        let at = self.expect(TokenKind::At, "\"@\"")?;
        let name = self.expect(TokenKind::Identifier, "decorator name")?;
        let mut args = Vec::new();

        if self.eat(TokenKind::LeftParen) {
            while !self.check(TokenKind::RightParen) && !self.check(TokenKind::Eof) {
                let tok = self.current();
                let arg = match tok.kind {
                    TokenKind::Number => DecoratorArg::Number(parse_number(tok)?),
                    TokenKind::String => DecoratorArg::String(tok.text.clone()),
                    TokenKind::Identifier => match tok.text.as_str() {
                        "true" => DecoratorArg::Bool(true),
                        "false" => DecoratorArg::Bool(false),
                        _ => DecoratorArg::String(tok.text.clone()),
                    },
                    _ => break,
                };
                self.advance();
                args.push(arg);

                if !self.check(TokenKind::RightParen) {
                    self.eat(TokenKind::Comma);
                }
            }
            self.expect(TokenKind::RightParen, "\")\"")?;
        }

        Ok(Decorator {
            name: name.text.clone(),
            args,
            line: at.line,
            column: at.column,
        })
    }

    fn parse_namespace(&mut self) -> Result<String, TbsError> {
        self.expect(TokenKind::Namespace, "\"namespace\"")?;
        let mut parts = vec![self.expect(TokenKind::Identifier, "namespace name")?.text.clone()];
        while self.eat(TokenKind::Dot) {
            parts.push(self.expect(TokenKind::Identifier, "namespace part")?.text.clone());
        }
        self.eat(TokenKind::Semicolon);
        Ok(parts.join("."))
    }

    fn parse_enum(&mut self, decorators: Vec<Decorator>) -> Result<EnumDefinition, TbsError> {
        self.expect(TokenKind::Enum, "\"enum\"")?;
        let name = self.expect(TokenKind::Identifier, "enum name")?;
        self.expect(TokenKind::LeftBrace, "\"{\"")?;

        let mut members = Vec::new();
        let mut member_doc = None;
        let mut next_value: u32 = 0;

        while !self.eat(TokenKind::RightBrace) {
            let member_decorators = self.parse_decorators(&mut member_doc)?;
            if member_decorators.is_empty() && self.check(TokenKind::RightBrace) {
                continue;
            }
            validate_decorators(&member_decorators, DecoratorTarget::EnumMember)?;
            let member = self.expect(TokenKind::Identifier, "enum member name")?;

            let value = match decorators::find(&member_decorators, decorators::VALUE) {
                Some(d) => d.args[0].as_int().unwrap_or_default() as u32,
                None => next_value,
            };
            if value > u8::MAX as u32 {
                return Err(error(
                    &format!("Value {} of enum member {} does not fit in uint8", value, quote(&member.text)),
                    member.line,
                    member.column,
                ));
            }

            members.push(EnumMember {
                name: member.text.clone(),
                value: value as u8,
                doc: member_doc.take(),
            });
            next_value = value + 1;
            self.eat(TokenKind::Comma);
        }

        Ok(EnumDefinition {
            name: name.text.clone(),
            members,
            base_type: PrimitiveKind::Uint8,
            decorators,
            doc: None,
            line: name.line,
            column: name.column,
        })
    }

    fn parse_model(&mut self, decorators: Vec<Decorator>) -> Result<ModelDefinition, TbsError> {
        self.expect(TokenKind::Model, "\"model\"")?;
        let name = self.expect(TokenKind::Identifier, "model name")?;
        self.expect(TokenKind::LeftBrace, "\"{\"")?;

        let mut fields = Vec::new();
        let mut field_doc = None;

        while !self.eat(TokenKind::RightBrace) {
            let field_decorators = self.parse_decorators(&mut field_doc)?;
            if field_decorators.is_empty() && self.check(TokenKind::RightBrace) {
                continue;
            }
            let mut field = self.parse_field(field_decorators)?;
            field.doc = field_doc.take();
            fields.push(field);
        }

        let command_id = decorators::find(&decorators, decorators::COMMAND_ID)
            .and_then(|d| d.args[0].as_int())
            .map(|n| n as u8);

        Ok(ModelDefinition {
            name: name.text.clone(),
            fields,
            decorators,
            doc: None,
            command_id,
            wire_size: WireSize::Variable,
            line: name.line,
            column: name.column,
        })
    }

    fn parse_field(&mut self, decorators: Vec<Decorator>) -> Result<FieldDefinition, TbsError> {
        let name = self.expect(TokenKind::Identifier, "field name")?;
        self.reject_optional()?;
        self.expect(TokenKind::Colon, "\":\"")?;

        let type_name = self.expect(TokenKind::Identifier, "type name")?;
        let mut ty = TypeInfo::from_name(&type_name.text);
        if self.eat(TokenKind::LeftBracket) {
            self.expect(TokenKind::RightBracket, "\"]\"")?;
            ty = TypeInfo::Array(Box::new(ty));
        }
        self.reject_optional()?;
        self.eat(TokenKind::Semicolon);

        validate_decorators(&decorators, DecoratorTarget::Field(&ty))?;
        let size = build_size_info(&decorators, &ty);

        Ok(FieldDefinition {
            name: name.text.clone(),
            ty,
            size,
            decorators,
            doc: None,
            offset: None,
            line: name.line,
            column: name.column,
        })
    }

    fn reject_optional(&mut self) -> Result<(), TbsError> {
        if self.check(TokenKind::Question) {
            let tok = self.current();
            return Err(error(
                "Optional fields are not supported by the wire format",
                tok.line,
                tok.column,
            ));
        }
        Ok(())
    }
}

fn parse_number(tok: &Token) -> Result<f64, TbsError> {
    let text = tok.text.as_str();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok().map(|n| n as f64),
        None => text.parse::<f64>().ok(),
    };
    parsed.ok_or_else(|| error(&format!("Invalid number {}", quote(text)), tok.line, tok.column))
}

fn build_size_info(decorators: &[Decorator], ty: &TypeInfo) -> SizeInfo {
    let mut size = SizeInfo::default();

    if let Some(d) = decorators::find(decorators, decorators::SIZE) {
        size.fixed_size = d.args[0].as_int().map(|n| n as usize);
    }
    if let Some(d) = decorators::find(decorators, decorators::LENGTH_PREFIX) {
        size.length_prefix = d.args[0].as_str().and_then(PrimitiveKind::from_name);
    }
    if size.fixed_size.is_none() {
        size.fixed_size = ty.primitive().and_then(PrimitiveKind::natural_size);
    }
    size
}

/// Parses a token stream into an IR without resolving names or layouts.
pub fn parse_schema(tokens: &[Token], source_file: &str, parsed_at: u64) -> Result<SchemaIR, TbsError> {
    let mut ir = SchemaIR {
        namespace: String::new(),
        enums: Vec::new(),
        models: Vec::new(),
        metadata: SchemaMetadata {
            source_file: source_file.to_string(),
            parsed_at,
            protocol_version: None,
        },
    };
    if tokens.is_empty() {
        return Ok(ir);
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        pending_doc: None,
    };
    parser.parse_schema(&mut ir)?;
    Ok(ir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_schema;

    fn parse(text: &str) -> Result<SchemaIR, TbsError> {
        let tokens = tokenize_schema(text)?;
        parse_schema(&tokens, "test.tsp", 0)
    }

    fn parse_err(text: &str) -> String {
        match parse(text) {
            Ok(ir) => panic!("expected a ParseError, got {:?}", ir),
            Err(e) => {
                assert!(matches!(e, TbsError::ParseError { .. }), "got {:?}", e);
                e.to_string()
            }
        }
    }

    #[test]
    fn test_parse_namespace() {
        let ir = parse("namespace Acme.Devices.V1;").unwrap();
        assert_eq!(ir.namespace, "Acme.Devices.V1");
        assert_eq!(ir.metadata.source_file, "test.tsp");
    }

    #[test]
    fn test_enum_auto_increment() {
        let ir = parse("enum E { A, B, C }").unwrap();
        let values: Vec<_> = ir.enums[0].members.iter().map(|m| (m.name.as_str(), m.value)).collect();
        assert_eq!(values, vec![("A", 0), ("B", 1), ("C", 2)]);
        assert_eq!(ir.enums[0].base_type, PrimitiveKind::Uint8);
    }

    #[test]
    fn test_enum_value_reseeds_counter() {
        let ir = parse("enum E { A, @value(5) B, C, @value(0xFF) D }").unwrap();
        let values: Vec<_> = ir.enums[0].members.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![0, 5, 6, 255]);
    }

    #[test]
    fn test_enum_value_overflow() {
        let msg = parse_err("enum E { @value(255) A, B }");
        assert!(msg.contains("does not fit in uint8"), "{}", msg);
    }

    #[test]
    fn test_parse_model_fields() {
        let ir = parse(
            r#"
            /// A ping.
            @command_id(0x01)
            model Ping {
                /// Sender clock.
                timestamp: uint64;
                @size(16) name: string;
                @length_prefix(uint16) data: bytes;
                samples: float32[];
                status: Status;
            }
            "#,
        )
        .unwrap();
        let model = &ir.models[0];
        assert_eq!(model.name, "Ping");
        assert_eq!(model.doc.as_deref(), Some("A ping."));
        assert_eq!(model.command_id, Some(1));

        let f = &model.fields;
        assert_eq!(f[0].doc.as_deref(), Some("Sender clock."));
        assert_eq!(f[0].ty, TypeInfo::Primitive(PrimitiveKind::Uint64));
        assert_eq!(f[0].size.fixed_size, Some(8));
        assert_eq!(f[1].size.fixed_size, Some(16));
        assert_eq!(f[2].size.length_prefix, Some(PrimitiveKind::Uint16));
        assert_eq!(f[2].size.fixed_size, None);
        assert_eq!(
            f[3].ty,
            TypeInfo::Array(Box::new(TypeInfo::Primitive(PrimitiveKind::Float32)))
        );
        assert_eq!(f[4].ty, TypeInfo::Model("Status".into()));
        assert_eq!(f[4].doc, None);
    }

    #[test]
    fn test_doc_comment_after_decorators() {
        let ir = parse(
            "model M {\n  @size(8) /// Display name.\n  name: string;\n  /// Trailing.\n}\n\
             enum E { @value(3) /// Third.\n C }",
        )
        .unwrap();
        let f = &ir.models[0].fields;
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].doc.as_deref(), Some("Display name."));
        assert_eq!(f[0].size.fixed_size, Some(8));

        let member = &ir.enums[0].members[0];
        assert_eq!((member.value, member.doc.as_deref()), (3, Some("Third.")));
    }

    #[test]
    fn test_decorator_arguments() {
        let ir = parse(r#"@command_id(0x10) model M { @length_prefix("uint8") x: bytes; }"#).unwrap();
        let d = &ir.models[0].decorators[0];
        assert_eq!(d.args, vec![DecoratorArg::Number(16.0)]);
        assert_eq!(ir.models[0].fields[0].size.length_prefix, Some(PrimitiveKind::Uint8));
    }

    #[test]
    fn test_optional_marker_is_rejected() {
        let msg = parse_err("model M { x?: uint8; }");
        assert!(msg.contains("Optional fields"), "{}", msg);
        parse_err("model M { x: uint8?; }");
    }

    #[test]
    fn test_decorator_errors_carry_position() {
        let err = parse("model M {\n  @size(4) x: uint32;\n}").unwrap_err();
        assert!(
            matches!(err, TbsError::ParseError { line: 2, column: 3, .. }),
            "got {:?}",
            err
        );
        parse_err("@packed model M { x: uint8; }");
        parse_err("@command_id(1) enum E { A }");
    }

    #[test]
    fn test_missing_field_type() {
        let msg = parse_err("model M { x: ; }");
        assert!(msg.contains("Expected type name"), "{}", msg);
        parse_err("model M { 42 }");
        parse_err("model M { x: uint8;");
    }

    #[test]
    fn test_unknown_top_level_tokens_are_skipped() {
        let ir = parse("import foo; model A { x: uint8; }").unwrap();
        assert_eq!(ir.models.len(), 1);
    }
}
