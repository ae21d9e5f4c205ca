use std::fmt;

use crate::{
    error::TbsError,
    types::{Decorator, PrimitiveKind, TypeInfo},
    utils::error,
};

pub const COMMAND_ID: &str = "command_id";
pub const SIZE: &str = "size";
pub const LENGTH_PREFIX: &str = "length_prefix";
pub const VALUE: &str = "value";

pub const KNOWN_DECORATORS: [&str; 4] = [COMMAND_ID, SIZE, LENGTH_PREFIX, VALUE];

/// What a run of decorators is attached to.
#[derive(Debug, Clone, Copy)]
pub enum DecoratorTarget<'a> {
    Namespace,
    Enum,
    EnumMember,
    Model,
    Field(&'a TypeInfo),
}

impl fmt::Display for DecoratorTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorTarget::Namespace => write!(f, "a namespace"),
            DecoratorTarget::Enum => write!(f, "an enum"),
            DecoratorTarget::EnumMember => write!(f, "an enum member"),
            DecoratorTarget::Model => write!(f, "a model"),
            DecoratorTarget::Field(ty) => write!(f, "a field of type {}", ty.name()),
        }
    }
}

pub fn find<'a>(decorators: &'a [Decorator], name: &str) -> Option<&'a Decorator> {
    decorators.iter().find(|d| d.name == name)
}

/// Checks a decorator run against the allow-list for its target.
pub fn validate_decorators(decorators: &[Decorator], target: DecoratorTarget) -> Result<(), TbsError> {
    for (i, decorator) in decorators.iter().enumerate() {
        let fail = |msg: String| Err(error(&msg, decorator.line, decorator.column));
        let name = decorator.name.as_str();

        if !KNOWN_DECORATORS.contains(&name) {
            return fail(format!("Unknown decorator @{}", name));
        }
        if decorators[..i].iter().any(|d| d.name == name) {
            return fail(format!("Duplicate decorator @{}", name));
        }

        let allowed = match name {
            COMMAND_ID => matches!(target, DecoratorTarget::Model),
            VALUE => matches!(target, DecoratorTarget::EnumMember),
            _ => matches!(target, DecoratorTarget::Field(_)),
        };
        if !allowed {
            return fail(format!("Decorator @{} cannot be applied to {}", name, target));
        }

        if decorator.args.len() != 1 {
            return fail(format!(
                "Decorator @{} expects 1 argument but found {}",
                name,
                decorator.args.len()
            ));
        }
        let arg = &decorator.args[0];

        match name {
            COMMAND_ID | VALUE => {
                if !matches!(arg.as_int(), Some(n) if n <= 255) {
                    return fail(format!("Decorator @{} expects an integer from 0 to 255", name));
                }
            }
            SIZE => {
                if !matches!(arg.as_int(), Some(n) if n >= 1) {
                    return fail(format!("Decorator @{} expects a positive integer", name));
                }
                if !matches!(
                    target,
                    DecoratorTarget::Field(TypeInfo::Primitive(PrimitiveKind::String | PrimitiveKind::Bytes))
                ) {
                    return fail(format!("Decorator @size cannot be applied to {}", target));
                }
                if find(decorators, LENGTH_PREFIX).is_some() {
                    return fail("Decorators @size and @length_prefix cannot be combined".to_string());
                }
            }
            _ => {
                let prefix = arg.as_str().and_then(PrimitiveKind::from_name);
                if !matches!(prefix, Some(kind) if kind.is_length_prefix()) {
                    return fail(format!(
                        "Decorator @{} expects one of uint8, uint16, uint32, uint64",
                        name
                    ));
                }
                if let DecoratorTarget::Field(TypeInfo::Primitive(kind)) = target {
                    if kind.is_scalar() {
                        return fail(format!("Decorator @length_prefix cannot be applied to {}", target));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecoratorArg;

    fn deco(name: &str, args: Vec<DecoratorArg>) -> Decorator {
        Decorator {
            name: name.to_string(),
            args,
            line: 1,
            column: 1,
        }
    }

    fn num(n: f64) -> DecoratorArg {
        DecoratorArg::Number(n)
    }

    fn ident(s: &str) -> DecoratorArg {
        DecoratorArg::String(s.to_string())
    }

    fn check(decorators: Vec<Decorator>, target: DecoratorTarget) -> Result<(), String> {
        validate_decorators(&decorators, target).map_err(|e| e.to_string())
    }

    #[test]
    fn test_accepts_allowed_decorators() {
        let string = TypeInfo::Primitive(PrimitiveKind::String);
        let bytes = TypeInfo::Primitive(PrimitiveKind::Bytes);
        let array = TypeInfo::Array(Box::new(TypeInfo::Primitive(PrimitiveKind::Uint8)));
        let nested = TypeInfo::Model("Inner".into());
        assert!(check(vec![deco("command_id", vec![num(129.0)])], DecoratorTarget::Model).is_ok());
        assert!(check(vec![deco("value", vec![num(255.0)])], DecoratorTarget::EnumMember).is_ok());
        assert!(check(vec![deco("size", vec![num(32.0)])], DecoratorTarget::Field(&string)).is_ok());
        assert!(check(vec![deco("length_prefix", vec![ident("uint16")])], DecoratorTarget::Field(&bytes)).is_ok());
        assert!(check(vec![deco("length_prefix", vec![ident("uint8")])], DecoratorTarget::Field(&array)).is_ok());
        assert!(check(vec![deco("length_prefix", vec![ident("uint32")])], DecoratorTarget::Field(&nested)).is_ok());
    }

    #[test]
    fn test_rejects_unknown_and_duplicate() {
        let err = check(vec![deco("packed", vec![])], DecoratorTarget::Model).unwrap_err();
        assert!(err.contains("Unknown decorator @packed"), "{}", err);

        let err = check(
            vec![deco("command_id", vec![num(1.0)]), deco("command_id", vec![num(2.0)])],
            DecoratorTarget::Model,
        )
        .unwrap_err();
        assert!(err.contains("Duplicate decorator"), "{}", err);
    }

    #[test]
    fn test_rejects_wrong_target() {
        let uint8 = TypeInfo::Primitive(PrimitiveKind::Uint8);
        assert!(check(vec![deco("command_id", vec![num(1.0)])], DecoratorTarget::Enum).is_err());
        assert!(check(vec![deco("value", vec![num(1.0)])], DecoratorTarget::Field(&uint8)).is_err());
        assert!(check(vec![deco("size", vec![num(4.0)])], DecoratorTarget::Model).is_err());
        assert!(check(vec![deco("size", vec![num(4.0)])], DecoratorTarget::Field(&uint8)).is_err());
        assert!(check(vec![deco("length_prefix", vec![ident("uint8")])], DecoratorTarget::Field(&uint8)).is_err());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let string = TypeInfo::Primitive(PrimitiveKind::String);
        assert!(check(vec![deco("command_id", vec![])], DecoratorTarget::Model).is_err());
        assert!(check(vec![deco("command_id", vec![num(256.0)])], DecoratorTarget::Model).is_err());
        assert!(check(vec![deco("command_id", vec![num(1.0), num(2.0)])], DecoratorTarget::Model).is_err());
        assert!(check(vec![deco("value", vec![ident("x")])], DecoratorTarget::EnumMember).is_err());
        assert!(check(vec![deco("size", vec![num(0.0)])], DecoratorTarget::Field(&string)).is_err());
        assert!(check(vec![deco("length_prefix", vec![ident("int16")])], DecoratorTarget::Field(&string)).is_err());
    }

    #[test]
    fn test_rejects_size_with_length_prefix() {
        let bytes = TypeInfo::Primitive(PrimitiveKind::Bytes);
        let err = check(
            vec![deco("size", vec![num(4.0)]), deco("length_prefix", vec![ident("uint8")])],
            DecoratorTarget::Field(&bytes),
        )
        .unwrap_err();
        assert!(err.contains("cannot be combined"), "{}", err);
    }
}
