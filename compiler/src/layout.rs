use std::collections::HashMap;

use tracing::trace;

use crate::{
    error::TbsError,
    types::{FieldDefinition, ModelDefinition, SchemaIR, TypeInfo, WireSize},
    utils::quote,
};

/// How many bytes a field occupies, as far as is known statically.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldWidth {
    Fixed(usize),
    /// Length-prefixed payload.
    Prefixed,
    /// Runs to the end of the buffer.
    Unbounded,
}

#[derive(Debug, Clone)]
struct ModelLayout {
    wire_size: WireSize,
    offsets: Vec<Option<usize>>,
    /// Resolved widths of enum and nested fixed-model fields.
    resolved_sizes: Vec<Option<usize>>,
}

struct LayoutContext<'a> {
    models: HashMap<&'a str, &'a ModelDefinition>,
    cache: HashMap<String, ModelLayout>,
    in_progress: Vec<String>,
}

impl<'a> LayoutContext<'a> {
    fn layout(&mut self, name: &str) -> Result<ModelLayout, TbsError> {
        if let Some(done) = self.cache.get(name) {
            return Ok(done.clone());
        }
        if let Some(start) = self.in_progress.iter().position(|n| n == name) {
            let mut path = self.in_progress[start..].to_vec();
            path.push(name.to_string());
            return Err(TbsError::CyclicReference(path));
        }
        let model = *self
            .models
            .get(name)
            .ok_or_else(|| TbsError::LayoutError(format!("Unknown model {}", quote(name))))?;

        self.in_progress.push(name.to_string());
        let result = self.compute(model);
        self.in_progress.pop();

        let layout = result?;
        trace!(model = name, wire_size = ?layout.wire_size, "computed layout");
        self.cache.insert(name.to_string(), layout.clone());
        Ok(layout)
    }

    fn compute(&mut self, model: &'a ModelDefinition) -> Result<ModelLayout, TbsError> {
        let mut offsets = Vec::with_capacity(model.fields.len());
        let mut resolved_sizes = Vec::with_capacity(model.fields.len());
        let mut running = Some(0usize);
        let mut total = 0usize;
        let mut variable = false;

        for (i, field) in model.fields.iter().enumerate() {
            let (width, resolved) = self.field_width(model, field)?;

            if width == FieldWidth::Unbounded && i + 1 != model.fields.len() {
                return Err(TbsError::LayoutError(format!(
                    "Field {} of model {} takes the rest of the buffer and must be the last field; \
                     add @size or @length_prefix",
                    quote(&field.name),
                    quote(&model.name)
                )));
            }

            offsets.push(running);
            resolved_sizes.push(resolved);
            running = match width {
                FieldWidth::Fixed(n) => {
                    total = total.checked_add(n).ok_or_else(|| {
                        TbsError::LayoutError(format!(
                            "Model {} is too large; field {} overflows its size",
                            quote(&model.name),
                            quote(&field.name)
                        ))
                    })?;
                    running.map(|_| total)
                }
                FieldWidth::Prefixed | FieldWidth::Unbounded => {
                    variable = true;
                    None
                }
            };
        }

        let wire_size = if variable {
            WireSize::Variable
        } else {
            WireSize::Fixed(total)
        };
        Ok(ModelLayout {
            wire_size,
            offsets,
            resolved_sizes,
        })
    }

    fn field_width(
        &mut self,
        model: &ModelDefinition,
        field: &FieldDefinition,
    ) -> Result<(FieldWidth, Option<usize>), TbsError> {
        if field.size.length_prefix.is_some() {
            match &field.ty {
                TypeInfo::Array(element) => {
                    self.element_size(model, field, element)?;
                }
                TypeInfo::Model(name) => {
                    self.layout(name)?;
                }
                _ => {}
            }
            return Ok((FieldWidth::Prefixed, None));
        }

        match &field.ty {
            TypeInfo::Enum(_) => Ok((FieldWidth::Fixed(1), Some(1))),
            TypeInfo::Model(name) => match self.layout(name)?.wire_size {
                WireSize::Fixed(n) => Ok((FieldWidth::Fixed(n), Some(n))),
                WireSize::Variable => Err(TbsError::LayoutError(format!(
                    "Field {} of model {} nests the variable-length model {} and needs @length_prefix",
                    quote(&field.name),
                    quote(&model.name),
                    quote(name)
                ))),
            },
            TypeInfo::Array(element) => {
                self.element_size(model, field, element)?;
                Ok((FieldWidth::Unbounded, None))
            }
            TypeInfo::Primitive(kind) => match field.size.fixed_size.or_else(|| kind.natural_size()) {
                Some(n) => Ok((FieldWidth::Fixed(n), None)),
                None => Ok((FieldWidth::Unbounded, None)),
            },
        }
    }

    /// Array elements are decoded back to back, so each needs a known,
    /// nonzero width.
    fn element_size(
        &mut self,
        model: &ModelDefinition,
        field: &FieldDefinition,
        element: &TypeInfo,
    ) -> Result<usize, TbsError> {
        let size = match element {
            TypeInfo::Primitive(kind) => kind.natural_size(),
            TypeInfo::Enum(_) => Some(1),
            TypeInfo::Model(name) => self.layout(name)?.wire_size.fixed(),
            TypeInfo::Array(_) => None,
        };
        if size == Some(0) {
            return Err(TbsError::LayoutError(format!(
                "Array field {} of model {} has elements of type {} that take no bytes",
                quote(&field.name),
                quote(&model.name),
                quote(&element.name())
            )));
        }
        size.ok_or_else(|| {
            TbsError::LayoutError(format!(
                "Array field {} of model {} needs elements of fixed size, but {} has none",
                quote(&field.name),
                quote(&model.name),
                quote(&element.name())
            ))
        })
    }
}

/// Computes wire sizes and field offsets for every model.
///
/// Expects a verified schema, so every named type resolves.
pub fn calculate_layouts(schema: &mut SchemaIR) -> Result<(), TbsError> {
    let layouts = {
        let mut ctx = LayoutContext {
            models: schema.models.iter().map(|m| (m.name.as_str(), m)).collect(),
            cache: HashMap::new(),
            in_progress: Vec::new(),
        };
        let mut layouts = Vec::with_capacity(schema.models.len());
        for model in &schema.models {
            layouts.push(ctx.layout(&model.name)?);
        }
        layouts
    };

    for (model, layout) in schema.models.iter_mut().zip(layouts) {
        model.wire_size = layout.wire_size;
        for ((field, offset), resolved) in model
            .fields
            .iter_mut()
            .zip(layout.offsets)
            .zip(layout.resolved_sizes)
        {
            field.offset = offset;
            if resolved.is_some() {
                field.size.fixed_size = resolved;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema, verifier::verify_schema};

    fn layout(text: &str) -> Result<SchemaIR, TbsError> {
        let tokens = tokenize_schema(text)?;
        let mut ir = parse_schema(&tokens, "test.tsp", 0)?;
        verify_schema(&mut ir)?;
        calculate_layouts(&mut ir)?;
        Ok(ir)
    }

    fn offsets(model: &ModelDefinition) -> Vec<Option<usize>> {
        model.fields.iter().map(|f| f.offset).collect()
    }

    #[test]
    fn test_fixed_header() {
        let ir = layout(
            "model ProtocolHeader { magic: uint16; version: uint8; command_id: uint8; \
             payload_length: uint32; sequence_id: uint32; checksum: uint16; }",
        )
        .unwrap();
        let m = &ir.models[0];
        assert_eq!(m.fixed_size(), Some(14));
        assert!(!m.has_variable_length());
        assert_eq!(
            offsets(m),
            vec![Some(0), Some(2), Some(3), Some(4), Some(8), Some(12)]
        );
    }

    #[test]
    fn test_strings_enums_and_nesting() {
        let ir = layout(
            "enum Status { Offline, Online } \
             model Info { status: Status; @size(32) name: string; @size(16) fw: string; \
                          uptime: uint32; temperature: int16; battery: uint8; } \
             model Vector3D { x: float32; y: float32; z: float32; } \
             model Sensor { timestamp: uint64; id: uint8; position: Vector3D; t: float32; h: float32; }",
        )
        .unwrap();
        assert_eq!(ir.models[0].fixed_size(), Some(56));
        assert_eq!(ir.models[0].fields[0].size.fixed_size, Some(1));
        assert_eq!(ir.models[1].fixed_size(), Some(12));

        let sensor = &ir.models[2];
        assert_eq!(sensor.fixed_size(), Some(29));
        assert_eq!(sensor.fields[2].offset, Some(9));
        assert_eq!(sensor.fields[2].size.fixed_size, Some(12));
        assert_eq!(sensor.fields[3].offset, Some(21));
    }

    #[test]
    fn test_forward_reference_is_laid_out_first() {
        let ir = layout("model Outer { a: uint8; inner: Inner; } model Inner { v: uint32; }").unwrap();
        assert_eq!(ir.models[0].fixed_size(), Some(5));
    }

    #[test]
    fn test_length_prefix_stops_offsets() {
        let ir = layout(
            "model SendData { channel: uint8; priority: uint8; @length_prefix(uint16) data: bytes; tail: uint8; }",
        )
        .unwrap();
        let m = &ir.models[0];
        assert!(m.has_variable_length());
        assert_eq!(m.fixed_size(), None);
        assert_eq!(offsets(m), vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn test_arrays() {
        let ir = layout(
            "model V { x: float32; } \
             model A { count: uint8; @length_prefix(uint16) items: V[]; rest: uint16[]; }",
        )
        .unwrap();
        assert!(ir.models[1].has_variable_length());
        assert_eq!(offsets(&ir.models[1]), vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_array_elements_need_fixed_size() {
        let err = layout("model A { @length_prefix(uint8) names: string[]; }").unwrap_err();
        assert!(matches!(err, TbsError::LayoutError(_)), "got {:?}", err);

        let err = layout(
            "model V { @length_prefix(uint8) d: bytes; } model A { @length_prefix(uint8) vs: V[]; }",
        )
        .unwrap_err();
        assert!(matches!(err, TbsError::LayoutError(_)), "got {:?}", err);
    }

    #[test]
    fn test_array_elements_need_nonzero_size() {
        for src in [
            "model E { } model A { @length_prefix(uint8) items: E[]; }",
            "model E { } model A { items: E[]; }",
        ] {
            let err = layout(src).unwrap_err();
            assert!(err.to_string().contains("take no bytes"), "{}", err);
        }
        // A zero-size model is still fine as a plain field.
        let ir = layout("model E { } model A { e: E; x: uint8; }").unwrap();
        assert_eq!(ir.models[1].fixed_size(), Some(1));
    }

    #[test]
    fn test_oversized_model_is_an_error() {
        let err = layout("model A { a: uint8; @size(0xFFFFFFFFFFFFFFFF) b: bytes; }").unwrap_err();
        assert!(matches!(err, TbsError::LayoutError(_)), "got {:?}", err);
    }

    #[test]
    fn test_unbounded_field_must_be_last() {
        assert!(layout("model A { data: bytes; }").is_ok());
        let err = layout("model A { data: bytes; crc: uint16; }").unwrap_err();
        assert!(matches!(err, TbsError::LayoutError(_)), "got {:?}", err);
    }

    #[test]
    fn test_variable_nested_model() {
        let src = "model Inner { @length_prefix(uint8) d: bytes; }";
        let err = layout(&format!("{} model Outer {{ inner: Inner; }}", src)).unwrap_err();
        assert!(matches!(err, TbsError::LayoutError(_)), "got {:?}", err);

        let ir = layout(&format!("{} model Outer {{ @length_prefix(uint16) inner: Inner; }}", src)).unwrap();
        assert!(ir.models[1].has_variable_length());
    }

    #[test]
    fn test_cyclic_reference() {
        let err = layout("model A { b: B; } model B { a: A; }").unwrap_err();
        match err {
            TbsError::CyclicReference(path) => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected CyclicReference, got {:?}", other),
        }

        let err = layout("model Node { @length_prefix(uint8) next: Node; }").unwrap_err();
        assert!(matches!(err, TbsError::CyclicReference(_)), "got {:?}", err);
    }
}
