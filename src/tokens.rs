/// Cursor over the tokens of a single parser node.
pub(crate) struct Tokens {
    after_double_dash: bool,
    rargs: Vec<String>,
    /// Letters left over from a `-vf` style stack.
    stacked: Option<String>,
}

/// One classified token.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Token {
    /// `--name`, with the value of `--name=value` split off.
    Long(String, Option<String>),
    /// `-x`, with an attached value for `-xVALUE`.
    Short(char, Option<String>),
    Positional(String),
}

impl Tokens {
    pub(crate) fn new(mut args: Vec<String>) -> Self {
        args.reverse();
        Self { after_double_dash: false, rargs: args, stacked: None }
    }

    pub(crate) fn pop(&mut self) -> Option<Token> {
        if let Some(rest) = self.stacked.take() {
            return short(&rest);
        }
        let arg = self.rargs.pop()?;
        if self.after_double_dash || !is_option(&arg) {
            return Some(Token::Positional(arg));
        }
        if arg == "--" {
            self.after_double_dash = true;
            return self.pop();
        }
        if let Some(long) = arg.strip_prefix("--") {
            let res = match long.split_once('=') {
                Some((name, value)) => Token::Long(name.to_string(), Some(value.to_string())),
                None => Token::Long(long.to_string(), None),
            };
            return Some(res);
        }
        short(&arg[1..])
    }

    /// Makes the letters after a flag in `-vf` the next token.
    pub(crate) fn unstack(&mut self, rest: String) {
        self.stacked = Some(rest);
    }

    /// Takes the next token if it can serve as a value.
    pub(crate) fn next_value(&mut self) -> Option<String> {
        let next = self.rargs.last()?;
        if !self.after_double_dash && is_option(next) {
            return None;
        }
        self.rargs.pop()
    }
}

fn short(letters: &str) -> Option<Token> {
    let mut chars = letters.chars();
    let short = chars.next()?;
    let rest = chars.as_str();
    let attached = if rest.is_empty() { None } else { Some(rest.to_string()) };
    Some(Token::Short(short, attached))
}

/// Anything starting with a dash, except negative numbers and a lone `-`.
pub(crate) fn is_option(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && !is_negative_number(arg)
}

// `-inf` and `-nan` parse as floats but are options.
fn is_negative_number(arg: &str) -> bool {
    arg[1..].starts_with(|c: char| c.is_ascii_digit() || c == '.') && arg.parse::<f64>().is_ok()
}
