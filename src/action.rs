//! Turns an [`Argument`] into the action that converts its raw tokens.

use thiserror::Error;

use crate::{
    argument::{Argument, ArgumentKind, Arity, Mapping, MappingError},
    error::{parse_err, Result},
    value::{ScalarType, Value, ValueType},
};

#[derive(Debug, Error)]
#[error("invalid value `{token}`")]
pub struct InvalidToken {
    token: String,
}

pub(crate) enum Action {
    /// Flags: presence stores the carried value, no token is consumed.
    Toggle(bool),
    Builtin(Converter),
    Custom(Converter),
}

/// Builtin type table entry, or a user supplied mapping.
pub(crate) enum Converter {
    Scalar { ty: ScalarType, multi: bool },
    Collection { kind: crate::value::CollectionKind, ty: ScalarType },
    Mapping(Mapping),
    /// A custom type without mapping; only reachable with a default.
    Missing,
}

pub(crate) fn resolve(arg: &Argument) -> Action {
    if let ArgumentKind::Flag { represents_true, .. } = arg.kind {
        return Action::Toggle(represents_true);
    }
    if let Some(mapping) = &arg.mapping {
        return Action::Custom(Converter::Mapping(mapping.clone()));
    }
    let converter = match arg.ty {
        ValueType::Scalar(ty) => Converter::Scalar { ty, multi: Arity::is_multi(arg.arity) },
        ValueType::Collection(kind, ty) => Converter::Collection { kind, ty },
        ValueType::Custom(_) => Converter::Missing,
    };
    if arg.validation.is_none() && arg.on_mapping_failed.is_none() && arg.ty.is_builtin() {
        Action::Builtin(converter)
    } else {
        Action::Custom(converter)
    }
}

impl Converter {
    fn convert(&self, raw: &[String]) -> Option<Result<Value, MappingError>> {
        let res = match self {
            Converter::Scalar { ty, multi: false } => match raw.first() {
                None => Ok(Value::None),
                Some(token) => scalar(*ty, token),
            },
            Converter::Scalar { ty, multi: true } => {
                raw.iter().map(|it| scalar(*ty, it)).collect::<Result<Vec<_>, _>>().map(Value::List)
            }
            Converter::Collection { kind, ty } => {
                raw.iter().map(|it| scalar(*ty, it)).collect::<Result<Vec<_>, _>>().map(|it| kind.wrap(it))
            }
            Converter::Mapping(f) => f(raw),
            Converter::Missing => return None,
        };
        Some(res)
    }
}

fn scalar(ty: ScalarType, token: &str) -> Result<Value, MappingError> {
    ty.convert(token).ok_or_else(|| InvalidToken { token: token.to_string() }.into())
}

impl Action {
    /// Applies the action to the tokens given for `option` (the spelling used
    /// on the command line, or the positional name).
    pub(crate) fn apply(
        &self,
        arg: &Argument,
        command: &str,
        option: &str,
        raw: &[String],
    ) -> Result<Value> {
        match self {
            Action::Toggle(value) => Ok(Value::Bool(*value)),
            // `?` given without a value stores nothing, whatever the hooks say.
            _ if raw.is_empty() && arg.arity == Some(Arity::Optional) => Ok(Value::None),
            Action::Builtin(converter) => match converter.convert(raw) {
                Some(Ok(value)) => Ok(value),
                Some(Err(err)) => Err(parse_err!(command, "Can't parse `{option}` as {}, {err}", arg.ty)),
                None => Err(unparsable(arg, command, option, raw)),
            },
            Action::Custom(converter) => {
                let passes = arg.validation.as_ref().map_or(true, |it| it(raw));
                if passes {
                    match converter.convert(raw) {
                        Some(Ok(value)) => return Ok(value),
                        Some(Err(err)) => {
                            return match &arg.on_mapping_failed {
                                Some(recover) => Ok(recover(&err, raw, arg.default.as_ref())),
                                None => Err(parse_err!(
                                    command,
                                    "Can't parse `{option}` as {}, {err}",
                                    arg.ty
                                )),
                            }
                        }
                        None => (),
                    }
                }
                match &arg.default {
                    Some(default) => Ok(default.clone()),
                    None => Err(unparsable(arg, command, option, raw)),
                }
            }
        }
    }
}

fn unparsable(arg: &Argument, command: &str, option: &str, raw: &[String]) -> crate::Error {
    parse_err!(command, "Can't parse `{option}` as {}, invalid value `{}`", arg.ty, raw.join(" "))
}
