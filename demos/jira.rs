//! A tiny issue tracker front end.
//!
//! ```text
//! cargo run --example jira -- issue -k ABC-1234 info
//! cargo run --example jira -- --interactive
//! RUST_LOG=argtree=trace cargo run --example jira -- issue create -s "Broken build"
//! ```

use std::io;

use argtree::{
    repl::{Repl, ReplSettings},
    Argument, Cli, Command, CommandDef, Lineage, ValueType,
};
use tracing_subscriber::EnvFilter;

struct Jira;

impl Command for Jira {
    fn call(&mut self, _: &Lineage<'_>) -> anyhow::Result<()> {
        println!("jira: pick a subcommand, see `--help`");
        Ok(())
    }
}

struct Issue {
    key: Option<String>,
}

impl Command for Issue {
    fn call(&mut self, _: &Lineage<'_>) -> anyhow::Result<()> {
        println!("issue: pick `info` or `create`");
        Ok(())
    }
}

struct Info;

impl Command for Info {
    fn call(&mut self, lineage: &Lineage<'_>) -> anyhow::Result<()> {
        let key = lineage.find::<Issue>().and_then(|it| it.key.as_deref());
        match key {
            Some(key) => println!("{key}: Open, assigned to nobody"),
            None => anyhow::bail!("`info` needs an issue key, pass `issue -k KEY info`"),
        }
        Ok(())
    }
}

struct Create {
    summary: String,
}

impl Command for Create {
    fn call(&mut self, lineage: &Lineage<'_>) -> anyhow::Result<()> {
        if self.summary.trim().is_empty() {
            anyhow::bail!("summary can't be empty");
        }
        let project = lineage
            .find::<Issue>()
            .and_then(|it| it.key.as_deref())
            .and_then(|key| key.split_once('-'))
            .map_or("JIRA", |(project, _)| project);
        println!("{project}-1: {}", self.summary);
        Ok(())
    }
}

fn def() -> CommandDef {
    let info = CommandDef::new("info", |_| Ok(Info)).description("Shows info to the given ticket.");
    let create = CommandDef::new("create", |args| {
        Ok(Create { summary: args.get::<Option<String>>("summary")?.unwrap_or_default() })
    })
    .description("Creates new ticket")
    .argument("summary", Argument::named("summary", ValueType::STR).help("One line summary"));
    let issue = CommandDef::new("issue", |args| Ok(Issue { key: args.get("key")? }))
        .description("Works with a single issue")
        .argument("key", Argument::named("key", ValueType::STR).help("Issue key, e.g. ABC-1234"))
        .subcommand(info)
        .subcommand(create);

    CommandDef::new("jira", |_| Ok(Jira))
        .description("Command line client for an issue tracker")
        .argument(
            "interactive",
            Argument::flag("interactive").help("read commands from stdin until `exit`"),
        )
        .subcommand(issue)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::new(def())?;
    let parsed = cli.parser().parse_or_exit(std::env::args().skip(1));
    if parsed.get::<bool>("interactive")? && parsed.sub.is_none() {
        let show_tokens = std::env::var_os("JIRA_SHOW_TOKENS").is_some();
        let settings = ReplSettings { prompt: None, show_tokens };
        Repl::new(&cli, settings).run(&mut io::stdin().lock(), &mut io::stdout())?;
        return Ok(());
    }

    let mut invocation = cli.bind(&parsed)?;
    if let Err(err) = invocation.run() {
        err.exit()
    }
    Ok(())
}
