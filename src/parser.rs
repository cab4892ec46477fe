//! One level of a command hierarchy and the recursive parse over it.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
    action::{self, Action},
    argument::{Argument, ArgumentKind, Arity},
    error::{binding_err, config_err, parse_err, Error, Result},
    help,
    tokens::{Token, Tokens},
    value::{self, FromValue, Value},
};

/// Result of parsing one level, linked to the result of the matched
/// subcommand.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArguments {
    pub name: String,
    pub args: BTreeMap<String, Value>,
    pub sub_name: Option<String>,
    pub sub: Option<Box<ParsedArguments>>,
}

impl ParsedArguments {
    pub fn new(name: &str) -> ParsedArguments {
        ParsedArguments { name: name.to_string(), args: BTreeMap::new(), sub_name: None, sub: None }
    }

    pub fn value(&self, dest: &str) -> Option<&Value> {
        self.args.get(dest)
    }

    /// Typed access to a destination; missing keys and type mismatches are
    /// binding errors.
    pub fn get<T: FromValue>(&self, dest: &str) -> Result<T> {
        let value = self
            .args
            .get(dest)
            .ok_or_else(|| binding_err!("`{}` has no argument bound to `{dest}`", self.name))?;
        value::extract(dest, value)
    }

    /// Names from this level down to the deepest matched subcommand.
    pub fn path(&self) -> Vec<&str> {
        let mut res = vec![self.name.as_str()];
        let mut curr = self;
        while let Some(sub) = &curr.sub {
            res.push(sub.name.as_str());
            curr = &**sub;
        }
        res
    }
}

struct Slot {
    dest: String,
    argument: Argument,
    action: Action,
}

pub struct ParserNode {
    name: String,
    short_info: String,
    slots: Vec<Slot>,
    subparsers: BTreeMap<String, ParserNode>,
    parent_chain: Vec<String>,
}

impl ParserNode {
    pub fn new(name: &str) -> ParserNode {
        ParserNode {
            name: name.to_string(),
            short_info: String::new(),
            slots: Vec::new(),
            subparsers: BTreeMap::new(),
            parent_chain: Vec::new(),
        }
    }

    pub fn with_short_info(mut self, short_info: &str) -> ParserNode {
        self.short_info = short_info.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_info(&self) -> &str {
        &self.short_info
    }

    pub fn parent_chain(&self) -> &[String] {
        &self.parent_chain
    }

    /// Parent chain and own name, space separated.
    pub fn path(&self) -> String {
        let mut res = self.parent_chain.join(" ");
        if !res.is_empty() {
            res.push(' ');
        }
        res.push_str(&self.name);
        res
    }

    /// Registered arguments with their destinations, in registration order.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &Argument)> + '_ {
        self.slots.iter().map(|it| (it.dest.as_str(), &it.argument))
    }

    /// Child nodes, sorted by name.
    pub fn subparsers(&self) -> impl Iterator<Item = &ParserNode> + '_ {
        self.subparsers.values()
    }

    pub fn subparser(&self, name: &str) -> Option<&ParserNode> {
        self.subparsers.get(name)
    }

    /// Registers `argument` under `dest`. Positional arguments are always
    /// required.
    pub fn add_argument(&mut self, dest: &str, mut argument: Argument) -> Result<&mut ParserNode> {
        argument.check()?;
        if argument.is_positional() {
            argument.required = true;
        }
        if self.slots.iter().any(|it| it.dest == dest) {
            return Err(config_err!("`{}` already has an argument bound to `{dest}`", self.path()));
        }
        if !argument.is_positional() {
            let long = argument.long_form();
            let short = argument.short_name();
            if long == "--help" || short == Some('h') {
                return Err(config_err!("`{long}` clashes with `-h, --help` in `{}`", self.path()));
            }
            for other in self.slots.iter().map(|it| &it.argument).filter(|it| !it.is_positional()) {
                if other.name == argument.name || (short.is_some() && other.short_name() == short) {
                    return Err(config_err!(
                        "`{long}` clashes with `{}` in `{}`",
                        other.long_form(),
                        self.path()
                    ));
                }
            }
        }
        let action = action::resolve(&argument);
        self.slots.push(Slot { dest: dest.to_string(), argument, action });
        Ok(self)
    }

    /// Creates a child node and returns it for further registration.
    pub fn add_subparser(&mut self, name: &str, short_info: &str) -> Result<&mut ParserNode> {
        if name.is_empty() || name.starts_with('-') {
            return Err(config_err!("invalid subcommand name `{name}`"));
        }
        if self.subparsers.contains_key(name) {
            return Err(config_err!("`{}` already has a subcommand `{name}`", self.path()));
        }
        let mut parent_chain = self.parent_chain.clone();
        parent_chain.push(self.name.clone());
        let child = ParserNode {
            name: name.to_string(),
            short_info: short_info.to_string(),
            slots: Vec::new(),
            subparsers: BTreeMap::new(),
            parent_chain,
        };
        Ok(self.subparsers.entry(name.to_string()).or_insert(child))
    }

    pub fn help(&self) -> String {
        help::render(self)
    }

    /// Parses `args` against this node and, from the first token naming one
    /// of its subcommands on, against that subcommand.
    ///
    /// `-h`/`--help` yields [`Error::Help`] with the help text of the level
    /// it was given at.
    pub fn parse<I, S>(&self, args: I) -> Result<ParsedArguments>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_vec(args.into_iter().map(Into::into).collect())
    }

    /// Like [`ParserNode::parse`], but prints help or the error and exits.
    pub fn parse_or_exit<I, S>(&self, args: I) -> ParsedArguments
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse(args).unwrap_or_else(|err| err.exit())
    }

    fn parse_vec(&self, mut args: Vec<String>) -> Result<ParsedArguments> {
        // The first token spelling any subcommand name splits the stream,
        // even if it was meant as a value.
        let split = args.iter().position(|it| self.subparsers.contains_key(it));
        let sub_args = match split {
            Some(idx) => args.split_off(idx),
            None => Vec::new(),
        };
        debug!(command = %self.path(), own = args.len(), sub = ?sub_args.first(), "split tokens");

        let mut res = ParsedArguments::new(&self.name);
        res.args = self.parse_own(args)?;

        if let Some((sub_name, rest)) = sub_args.split_first() {
            let sub = &self.subparsers[sub_name];
            res.sub = Some(Box::new(sub.parse_vec(rest.to_vec())?));
            res.sub_name = Some(sub_name.clone());
        }
        Ok(res)
    }

    fn parse_own(&self, args: Vec<String>) -> Result<BTreeMap<String, Value>> {
        let path = self.path();
        let mut given: Vec<Option<(String, Vec<String>)>> = self.slots.iter().map(|_| None).collect();
        let mut positionals = Vec::new();

        let mut p = Tokens::new(args);
        while let Some(token) = p.pop() {
            let (idx, spelled, attached) = match token {
                Token::Long(name, attached) => {
                    if name == "help" {
                        return Err(Error::Help(self.help()));
                    }
                    let spelled = format!("--{name}");
                    match self.find(|arg| arg.name == name) {
                        Some(idx) => (idx, spelled, attached),
                        None => return Err(unexpected_flag(&path, &spelled)),
                    }
                }
                Token::Short(short, attached) => {
                    if short == 'h' {
                        return Err(Error::Help(self.help()));
                    }
                    let spelled = format!("-{short}");
                    let Some(idx) = self.find(|arg| arg.short_name() == Some(short)) else {
                        return Err(unexpected_flag(&path, &spelled));
                    };
                    let attached = match attached {
                        Some(rest) if self.slots[idx].argument.is_flag() && !rest.starts_with('=') => {
                            p.unstack(rest);
                            None
                        }
                        it => it,
                    };
                    (idx, spelled, attached)
                }
                Token::Positional(arg) => {
                    trace!(command = %path, %arg, "positional");
                    positionals.push(arg);
                    continue;
                }
            };

            if given[idx].is_some() {
                trace!(command = %path, option = %spelled, "given again, last one wins");
            }
            let argument = &self.slots[idx].argument;
            let mut raw = Vec::new();
            if argument.is_flag() {
                if attached.is_some() {
                    return Err(parse_err!(path, "Flag `{spelled}` doesn't take a value"));
                }
            } else {
                raw.extend(attached);
                let max = Arity::max(argument.arity);
                while max.map_or(true, |max| raw.len() < max) {
                    match p.next_value() {
                        Some(value) => raw.push(value),
                        None => break,
                    }
                }
                let min = Arity::min(argument.arity);
                if raw.len() < min {
                    return Err(parse_err!(path, "Expected {min} value(s) for `{spelled}`"));
                }
            }
            trace!(command = %path, option = %spelled, ?raw, "option");
            given[idx] = Some((spelled, raw));
        }

        self.distribute_positionals(&path, positionals, &mut given)?;

        let mut res = BTreeMap::new();
        for (slot, given) in self.slots.iter().zip(given) {
            let argument = &slot.argument;
            let value = match given {
                Some((spelled, raw)) => slot.action.apply(argument, &path, &spelled, &raw)?,
                None if argument.required => {
                    return Err(parse_err!(
                        path,
                        "Argument is required: `{}`. Use `--help` for more information",
                        argument.long_form()
                    ))
                }
                None => absent_value(argument),
            };
            res.insert(slot.dest.clone(), value);
        }
        Ok(res)
    }

    fn distribute_positionals(
        &self,
        path: &str,
        positionals: Vec<String>,
        given: &mut [Option<(String, Vec<String>)>],
    ) -> Result<()> {
        let indices = (0..self.slots.len())
            .filter(|&idx| self.slots[idx].argument.is_positional())
            .collect::<Vec<_>>();

        let mut rest = positionals.as_slice();
        for (k, &idx) in indices.iter().enumerate() {
            let argument = &self.slots[idx].argument;
            let later_min: usize =
                indices[k + 1..].iter().map(|&it| Arity::min(self.slots[it].argument.arity)).sum();
            let available = rest.len().saturating_sub(later_min);
            let take = Arity::max(argument.arity).map_or(available, |max| max.min(available));
            if take < Arity::min(argument.arity) {
                return Err(parse_err!(
                    path,
                    "Argument is required: `{}`. Use `--help` for more information",
                    argument.name
                ));
            }
            if take == 0 && argument.arity == Some(Arity::Optional) {
                continue;
            }
            let (taken, tail) = rest.split_at(take);
            given[idx] = Some((argument.name.clone(), taken.to_vec()));
            rest = tail;
        }

        match rest.first() {
            Some(arg) => Err(parse_err!(
                path,
                "Unexpected argument: `{arg}`. Use `--help` for more information"
            )),
            None => Ok(()),
        }
    }

    fn find(&self, pred: impl Fn(&Argument) -> bool) -> Option<usize> {
        self.slots.iter().position(|it| !it.argument.is_positional() && pred(&it.argument))
    }
}

fn unexpected_flag(path: &str, spelled: &str) -> Error {
    parse_err!(path, "Unknown flag: `{spelled}`. Use `--help` for more information")
}

fn absent_value(argument: &Argument) -> Value {
    if let Some(default) = &argument.default {
        return default.clone();
    }
    match argument.kind {
        ArgumentKind::Flag { represents_true, .. } => Value::Bool(!represents_true),
        _ => Value::None,
    }
}
