//! Declarative descriptions of a single command line slot.

use std::{fmt, sync::Arc};

use crate::{
    error::{config_err, Result},
    value::{Value, ValueType},
};

pub type MappingError = Box<dyn std::error::Error + Send + Sync>;

pub type Validation = Arc<dyn Fn(&[String]) -> bool + Send + Sync>;
pub type Mapping = Arc<dyn Fn(&[String]) -> Result<Value, MappingError> + Send + Sync>;
/// Receives the mapping error, the raw tokens and the default; returns the
/// value to use instead.
pub type MappingFailed =
    Arc<dyn Fn(&MappingError, &[String], Option<&Value>) -> Value + Send + Sync>;

/// How many tokens an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Arity {
    pub(crate) fn min(arity: Option<Arity>) -> usize {
        match arity {
            None => 1,
            Some(Arity::Exactly(n)) => n,
            Some(Arity::Optional | Arity::ZeroOrMore) => 0,
            Some(Arity::OneOrMore) => 1,
        }
    }

    pub(crate) fn max(arity: Option<Arity>) -> Option<usize> {
        match arity {
            None => Some(1),
            Some(Arity::Exactly(n)) => Some(n),
            Some(Arity::Optional) => Some(1),
            Some(Arity::ZeroOrMore | Arity::OneOrMore) => None,
        }
    }

    /// Whether the consumed tokens form a sequence rather than one value.
    pub(crate) fn is_multi(arity: Option<Arity>) -> bool {
        match arity {
            None | Some(Arity::Optional) => false,
            Some(Arity::Exactly(n)) => n != 1,
            Some(Arity::ZeroOrMore | Arity::OneOrMore) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentKind {
    Positional,
    Named { short_name: Option<char> },
    Flag { short_name: Option<char>, represents_true: bool },
}

#[derive(Clone)]
pub struct Argument {
    pub(crate) kind: ArgumentKind,
    pub(crate) name: String,
    pub(crate) ty: ValueType,
    pub(crate) arity: Option<Arity>,
    pub(crate) display_name: Option<String>,
    pub(crate) help_text: String,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) validation: Option<Validation>,
    pub(crate) mapping: Option<Mapping>,
    pub(crate) on_mapping_failed: Option<MappingFailed>,
}

impl Argument {
    fn new(kind: ArgumentKind, name: &str, ty: ValueType) -> Argument {
        Argument {
            kind,
            name: name.to_string(),
            ty,
            arity: None,
            display_name: None,
            help_text: String::new(),
            required: false,
            default: None,
            validation: None,
            mapping: None,
            on_mapping_failed: None,
        }
    }

    pub fn positional(name: &str, ty: ValueType) -> Argument {
        Argument::new(ArgumentKind::Positional, name, ty)
    }

    /// A `--name VALUE` option; the short alias defaults to the first
    /// character of `name`.
    pub fn named(name: &str, ty: ValueType) -> Argument {
        let short_name = name.chars().next();
        Argument::new(ArgumentKind::Named { short_name }, name, ty)
    }

    /// A valueless `--name` switch that stores `true` when present.
    pub fn flag(name: &str) -> Argument {
        let short_name = name.chars().next();
        let kind = ArgumentKind::Flag { short_name, represents_true: true };
        Argument::new(kind, name, ValueType::BOOL)
    }

    pub fn short(mut self, short: char) -> Argument {
        match &mut self.kind {
            ArgumentKind::Named { short_name } | ArgumentKind::Flag { short_name, .. } => {
                *short_name = Some(short)
            }
            ArgumentKind::Positional => (),
        }
        self
    }

    /// Selects whether presence of a flag stores `true` or `false`.
    pub fn represents_true(mut self, value: bool) -> Argument {
        if let ArgumentKind::Flag { represents_true, .. } = &mut self.kind {
            *represents_true = value;
        }
        self
    }

    pub fn display_name(mut self, display_name: &str) -> Argument {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn help(mut self, help_text: &str) -> Argument {
        self.help_text = help_text.to_string();
        self
    }

    pub fn required(mut self, required: bool) -> Argument {
        self.required = required;
        self
    }

    pub fn arity(mut self, arity: Arity) -> Argument {
        self.arity = Some(arity);
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Argument {
        self.default = Some(default.into());
        self
    }

    pub fn validation(mut self, f: impl Fn(&[String]) -> bool + Send + Sync + 'static) -> Argument {
        self.validation = Some(Arc::new(f));
        self
    }

    pub fn mapping(
        mut self,
        f: impl Fn(&[String]) -> Result<Value, MappingError> + Send + Sync + 'static,
    ) -> Argument {
        self.mapping = Some(Arc::new(f));
        self
    }

    pub fn on_mapping_failed(
        mut self,
        f: impl Fn(&MappingError, &[String], Option<&Value>) -> Value + Send + Sync + 'static,
    ) -> Argument {
        self.on_mapping_failed = Some(Arc::new(f));
        self
    }

    pub fn kind(&self) -> &ArgumentKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ValueType {
        self.ty
    }

    pub fn number_of_arguments(&self) -> Option<Arity> {
        self.arity
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn display_name_or_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn short_name(&self) -> Option<char> {
        match &self.kind {
            ArgumentKind::Named { short_name } | ArgumentKind::Flag { short_name, .. } => {
                *short_name
            }
            ArgumentKind::Positional => None,
        }
    }

    pub fn is_positional(&self) -> bool {
        self.kind == ArgumentKind::Positional
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ArgumentKind::Flag { .. })
    }

    /// `--name` for options, the bare name for positionals.
    pub fn long_form(&self) -> String {
        match self.kind {
            ArgumentKind::Positional => self.name.clone(),
            _ => format!("--{}", self.name),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(config_err!("argument name can't be empty"));
        }
        if self.name.starts_with('-') {
            return Err(config_err!("argument name `{}` can't start with `-`", self.name));
        }
        if self.arity == Some(Arity::Exactly(0)) {
            return Err(config_err!("argument `{}` must consume at least one token", self.name));
        }
        if !self.ty.is_builtin() && self.mapping.is_none() && !self.is_flag() {
            return Err(config_err!(
                "argument `{}` has type `{}` which needs an explicit mapping",
                self.name,
                self.ty
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("arity", &self.arity)
            .field("display_name", &self.display_name)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
