//! Declarative command line parsing with nested subcommands.
//!
//! A [`ParserNode`] owns the [`Argument`]s of one command level and its
//! child nodes. Parsing splits the tokens at the first subcommand name,
//! parses the head against the node's own arguments and recurses with the
//! rest, producing a linked [`ParsedArguments`] chain.
//!
//! ```
//! use argtree::{Argument, Arity, ParserNode, ScalarType, Value, ValueType};
//!
//! let mut parser = ParserNode::new("prog");
//! parser
//!     .add_argument("integers", Argument::named("integers", ValueType::list(ScalarType::Int))
//!         .arity(Arity::OneOrMore)
//!         .required(true))?
//!     .add_subparser("sub1", "")?
//!     .add_argument("foo", Argument::named("foo", ValueType::STR))?;
//!
//! let parsed = parser.parse(["-i", "1", "2", "sub1", "-f", "foo value"])?;
//! assert_eq!(parsed.args["integers"], Value::from(vec![1i64, 2]));
//! assert_eq!(parsed.sub.unwrap().args["foo"], Value::from("foo value"));
//! # Ok::<(), argtree::Error>(())
//! ```
//!
//! [`CommandDef`] and [`Cli`] bind the parse results onto user types
//! implementing [`Command`].

mod action;
mod argument;
mod command;
mod error;
pub mod help;
mod parser;
pub mod repl;
mod tokens;
mod value;

pub use crate::{
    argument::{Argument, ArgumentKind, Arity, MappingError},
    command::{AsAny, Cli, Command, CommandDef, Invocation, Lineage},
    error::{Error, Result},
    parser::{ParsedArguments, ParserNode},
    value::{CollectionKind, FromValue, ScalarType, Value, ValueType},
};
