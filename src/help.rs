//! Usage and help text of a [`ParserNode`].

use std::fmt::Write;

use crate::{
    argument::{Argument, ArgumentKind, Arity},
    parser::ParserNode,
};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

const HELP_TEXT: &str = "show this help message and exit";

/// Argument categories in the order they appear in the help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Flags,
    RequiredNamed,
    OptionalNamed,
    Positional,
}

impl Group {
    pub const ALL: [Group; 4] =
        [Group::Flags, Group::RequiredNamed, Group::OptionalNamed, Group::Positional];

    pub fn title(self) -> &'static str {
        match self {
            Group::Flags => "flags",
            Group::RequiredNamed => "required named arguments",
            Group::OptionalNamed => "optional named arguments",
            Group::Positional => "positional arguments",
        }
    }

    pub fn of(argument: &Argument) -> Group {
        match argument.kind() {
            ArgumentKind::Flag { .. } => Group::Flags,
            ArgumentKind::Named { .. } if argument.is_required() => Group::RequiredNamed,
            ArgumentKind::Named { .. } => Group::OptionalNamed,
            ArgumentKind::Positional => Group::Positional,
        }
    }
}

/// Arguments of `node` in `group`, in registration order.
pub fn grouped(node: &ParserNode, group: Group) -> Vec<(&str, &Argument)> {
    node.arguments().filter(|(_, arg)| Group::of(arg) == group).collect()
}

pub(crate) fn render(node: &ParserNode) -> String {
    let mut blocks = Vec::new();

    let mut usage = vec![node.name().to_string(), "[-h]".to_string()];
    usage.extend(node.arguments().map(|(_, arg)| usage_fragment(arg)));
    let names = node.subparsers().map(|it| it.name()).collect::<Vec<_>>();
    if !names.is_empty() {
        usage.push(format!("{{{}}}", names.join(",")));
    }
    blocks.push(format!("Usage:\n   {}\n", usage.join(" ")));

    if !names.is_empty() {
        let width = names.iter().map(|it| it.len()).max().unwrap_or(0) + 2;
        let mut buf = String::from("subcommands:\n");
        for sub in node.subparsers() {
            let line = format!("   {:<width$}{}", sub.name(), sub.short_info());
            w!(buf, "{}\n", line.trim_end());
        }
        blocks.push(buf);
    }

    for group in Group::ALL {
        let mut rows = grouped(node, group).into_iter().map(|(_, arg)| Row::of(arg)).collect::<Vec<_>>();
        if group == Group::Flags {
            rows.insert(0, Row::help());
        }
        if !rows.is_empty() {
            blocks.push(section(group.title(), &rows));
        }
    }

    blocks.join("\n")
}

struct Row {
    short: String,
    name: String,
    display: String,
    help: String,
}

impl Row {
    fn help() -> Row {
        Row {
            short: "-h, ".to_string(),
            name: "--help".to_string(),
            display: String::new(),
            help: HELP_TEXT.to_string(),
        }
    }

    fn of(arg: &Argument) -> Row {
        let short = arg.short_name().map(|it| format!("-{it}, ")).unwrap_or_default();
        let display = match arg.kind() {
            ArgumentKind::Flag { .. } => String::new(),
            ArgumentKind::Positional
                if arg.number_of_arguments().is_none() && arg.display_name.is_none() =>
            {
                String::new()
            }
            _ => display_with_arity(arg.display_name_or_name(), arg.number_of_arguments()),
        };
        let display = if display.is_empty() { display } else { format!("{display} ") };
        Row { short, name: arg.long_form(), display, help: arg.help_text().to_string() }
    }
}

fn section(title: &str, rows: &[Row]) -> String {
    let short_w = rows.iter().map(|it| it.short.len()).max().unwrap_or(0);
    let name_w = rows.iter().map(|it| it.name.len()).max().unwrap_or(0);
    let display_w = rows.iter().map(|it| it.display.len()).max().unwrap_or(0);

    let mut buf = String::new();
    w!(buf, "{title}:\n");
    for row in rows {
        let line = format!(
            "   {:<short_w$}{:<name_w$} {:<display_w$}{}",
            row.short, row.name, row.display, row.help
        );
        w!(buf, "{}\n", line.trim_end());
    }
    buf
}

/// `x`, `x x` for two, `[x]`, `[x ...]` or `x [x ...]`.
pub fn display_with_arity(display: &str, arity: Option<Arity>) -> String {
    match arity {
        None => display.to_string(),
        Some(Arity::Exactly(n)) => vec![display; n].join(" "),
        Some(Arity::Optional) => format!("[{display}]"),
        Some(Arity::ZeroOrMore) => format!("[{display} ...]"),
        Some(Arity::OneOrMore) => format!("{display} [{display} ...]"),
    }
}

/// The part of the usage line describing `arg`.
pub fn usage_fragment(arg: &Argument) -> String {
    let res = match arg.kind() {
        ArgumentKind::Positional => {
            return display_with_arity(arg.display_name_or_name(), arg.number_of_arguments())
        }
        ArgumentKind::Flag { short_name, .. } => spelling(arg, *short_name),
        ArgumentKind::Named { short_name } => format!(
            "{} {}",
            spelling(arg, *short_name),
            display_with_arity(arg.display_name_or_name(), arg.number_of_arguments())
        ),
    };
    if arg.is_required() {
        res
    } else {
        format!("[{res}]")
    }
}

fn spelling(arg: &Argument, short_name: Option<char>) -> String {
    match short_name {
        Some(short) => format!("-{short}"),
        None => arg.long_form(),
    }
}
