//! A minimal interactive loop over a [`Cli`].

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::{
    command::Cli,
    help::{grouped, Group},
};

#[derive(Debug, Clone, Default)]
pub struct ReplSettings {
    /// Defaults to `(<name>) >: `.
    pub prompt: Option<String>,
    /// Echo the tokens of every line before running it.
    pub show_tokens: bool,
}

/// Splits a line into tokens. Double quotes group, a backslash takes the
/// next character literally, an unterminated quote or escape simply ends the
/// line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut res = Vec::new();
    let mut buf = String::new();
    let mut pending = false;
    let mut escaped = false;
    let mut quoted = false;

    for c in line.chars() {
        if escaped {
            escaped = false;
            buf.push(c);
        } else if c == '\\' {
            escaped = true;
            pending = true;
        } else if c == '"' {
            quoted = !quoted;
            pending = true;
        } else if c.is_whitespace() && !quoted {
            if pending {
                res.push(std::mem::take(&mut buf));
                pending = false;
            }
        } else {
            buf.push(c);
            pending = true;
        }
    }
    if pending {
        res.push(buf);
    }
    res
}

pub struct Repl<'a> {
    cli: &'a Cli,
    settings: ReplSettings,
}

impl<'a> Repl<'a> {
    pub fn new(cli: &'a Cli, settings: ReplSettings) -> Repl<'a> {
        Repl { cli, settings }
    }

    /// Reads lines until `exit` or end of input. Every other line is run as
    /// a command line of the root command; failures are reported and the
    /// loop goes on.
    pub fn run(&self, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let prompt = match &self.settings.prompt {
            Some(it) => it.clone(),
            None => format!("({}) >: ", self.cli.def().name()),
        };
        writeln!(out, "{}", self.cli.def().name())?;

        let mut line = String::new();
        loop {
            write!(out, "{prompt}")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let tokens = split_line(line.trim_end_matches(|c: char| c == '\n' || c == '\r'));
            if self.settings.show_tokens {
                writeln!(out, "{tokens:?}")?;
            }
            match tokens.first().map(String::as_str) {
                None => continue,
                Some("exit") => break,
                Some("?" | "help") => self.describe(out)?,
                Some(_) => {
                    debug!(?tokens, "running line");
                    match self.cli.run(&tokens) {
                        Ok(invocation) => debug!(commands = ?invocation.names(), "done"),
                        Err(err) => write!(out, "{}", with_newline(err.to_string()))?,
                    }
                }
            }
        }
        Ok(())
    }

    fn describe(&self, out: &mut impl Write) -> io::Result<()> {
        let def = self.cli.def();
        let parser = self.cli.parser();
        let indent = " ".repeat(3);

        if !def.get_description().is_empty() {
            writeln!(out, "{}", def.get_description())?;
            writeln!(out)?;
        }
        let subcommands = def.subcommands().map(|it| it.name()).collect::<Vec<_>>();
        if !subcommands.is_empty() {
            writeln!(out, "Available Subcommands")?;
            for name in subcommands {
                writeln!(out, "{indent}{name}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "Arguments")?;
        for group in Group::ALL {
            let args = grouped(parser, group);
            if args.is_empty() {
                continue;
            }
            writeln!(out, "{indent}{}", title_case(group.title()))?;
            for (dest, arg) in args {
                match arg.short_name() {
                    _ if arg.is_positional() => writeln!(out, "{indent}{indent}{dest}")?,
                    Some(short) => writeln!(out, "{indent}{indent}-{short}, {}", arg.long_form())?,
                    None => writeln!(out, "{indent}{indent}{}", arg.long_form())?,
                }
            }
        }
        Ok(())
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
