use std::io::{self, Write};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A token could not be matched, converted or was missing.
    #[error("{command}: {msg}")]
    Parse { command: String, msg: String },

    /// The argument tree was registered inconsistently.
    #[error("invalid command line configuration: {0}")]
    Configuration(String),

    /// Parsed arguments don't fit the command definitions they are bound to.
    #[error("can't bind parsed arguments: {0}")]
    Binding(String),

    /// `-h`/`--help` was encountered; carries the help text of that level.
    #[error("{0}")]
    Help(String),

    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

macro_rules! parse_err {
    ($command:expr, $($tt:tt)*) => {
        $crate::Error::Parse { command: $command.to_string(), msg: format!($($tt)*) }
    };
}

macro_rules! config_err {
    ($($tt:tt)*) => {
        $crate::Error::Configuration(format!($($tt)*))
    };
}

macro_rules! binding_err {
    ($($tt:tt)*) => {
        $crate::Error::Binding(format!($($tt)*))
    };
}

pub(crate) use {binding_err, config_err, parse_err};

impl Error {
    pub fn is_help(&self) -> bool {
        matches!(self, Error::Help(_))
    }

    /// Help, bad input and failed commands. Configuration and binding errors
    /// are mistakes in the program itself.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Help(_) | Error::Command(_))
    }

    /// Prints help to stdout and exits with 0, or prints the error to stderr
    /// and exits with 2.
    pub fn exit(self) -> ! {
        if let Error::Help(text) = &self {
            print!("{text}");
            let _ = io::stdout().flush();
            std::process::exit(0)
        }
        eprintln!("{self}");
        std::process::exit(2)
    }
}
