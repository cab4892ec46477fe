
use std::io::Cursor;

use argtree::{
    repl::{split_line, Repl, ReplSettings},
    Argument, Arity, Cli, Command, CommandDef, Error, Lineage, ParserNode, ScalarType, Value,
    ValueType,
};
use expect_test::{expect, Expect};
use predicates::prelude::*;

use crate::jira::{Create, Info, Issue, Jira};

fn check(parser: &ParserNode, args: &[&str], expect: Expect) {
    match parser.parse(args.iter().copied()) {
        Ok(parsed) => expect.assert_debug_eq(&parsed),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

fn help_of(parser: &ParserNode, args: &[&str]) -> String {
    match parser.parse(args.iter().copied()) {
        Err(Error::Help(text)) => text,
        other => panic!("expected help, got {other:?}"),
    }
}

#[test]
fn nested_without_subcommand() {
    check(
        &nested::parser(),
        &["-a", "3", "-i", "1", "2", "3"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "argument": 3,
                    "integers": [1, 2, 3],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
}

#[test]
fn nested_with_subcommand() {
    let parsed =
        nested::parser().parse(["-a", "3", "-i", "1", "2", "3", "sub1", "-f", "foo value"]).unwrap();
    assert_eq!(parsed.name, "prog");
    assert_eq!(parsed.args["argument"], Value::Int(3));
    assert_eq!(parsed.args["integers"], Value::from(vec![1i64, 2, 3]));
    assert_eq!(parsed.sub_name.as_deref(), Some("sub1"));

    let sub = parsed.sub.as_deref().unwrap();
    assert_eq!(sub.name, "sub1");
    assert_eq!(sub.args["foo"], Value::from("foo value"));
    assert!(sub.sub.is_none());

    check(
        &nested::parser(),
        &["-a", "3", "-i", "4", "sub2", "-b", "x", "-a", "7"],
        expect!["prog sub2: Unknown flag: `-a`. Use `--help` for more information"],
    );
    check(
        &nested::parser(),
        &["-a", "3", "-i", "1", "sub1", "--bar", "x"],
        expect!["prog sub1: Unknown flag: `--bar`. Use `--help` for more information"],
    );
    check(
        &nested::parser(),
        &["-a", "3", "-i", "9", "sub2"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "argument": 3,
                    "integers": [9],
                },
                sub_name: Some(
                    "sub2",
                ),
                sub: Some(
                    ParsedArguments {
                        name: "sub2",
                        args: {
                            "bar": None,
                        },
                        sub_name: None,
                        sub: None,
                    },
                ),
            }
        "#]],
    );
}

#[test]
fn parse_errors() {
    let p = nested::parser();
    check(
        &p,
        &["-a", "3"],
        expect!["prog: Argument is required: `--integers`. Use `--help` for more information"],
    );
    check(&p, &["-a", "x", "-i", "1"], expect!["prog: Can't parse `-a` as int, invalid value `x`"]);
    check(
        &p,
        &["-a", "3", "-i", "1", "two"],
        expect!["prog: Can't parse `-i` as list[int], invalid value `two`"],
    );
    check(&p, &["-a", "3", "-i"], expect!["prog: Expected 1 value(s) for `-i`"]);
    check(
        &p,
        &["-a", "3", "-i", "1", "--werbose"],
        expect!["prog: Unknown flag: `--werbose`. Use `--help` for more information"],
    );
}

#[test]
fn optional_value_may_be_left_out() {
    check(
        &nested::parser(),
        &["-a", "-i", "1"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "argument": None,
                    "integers": [1],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );

    let mut p = ParserNode::new("prog");
    p.add_argument(
        "xs",
        Argument::named("xs", ValueType::list(ScalarType::Int)).arity(Arity::Optional),
    )
    .unwrap();
    assert_eq!(p.parse(["-x"]).unwrap().args["xs"], Value::None);
    assert_eq!(p.parse(["-x", "2"]).unwrap().args["xs"], Value::from(vec![2i64]));
}

#[test]
fn last_occurrence_wins() {
    check(
        &nested::parser(),
        &["-a", "3", "-i", "1", "-a", "4", "--integers", "5", "6"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "argument": 4,
                    "integers": [5, 6],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
}

#[test]
fn stacked_short_flags() {
    let mut p = ParserNode::new("tar");
    p.add_argument("verbose", Argument::flag("verbose"))
        .unwrap()
        .add_argument("extract", Argument::flag("extract").short('x'))
        .unwrap()
        .add_argument("file", Argument::named("file", ValueType::PATH))
        .unwrap();

    check(
        &p,
        &["-vxf", "a.tar"],
        expect![[r#"
            ParsedArguments {
                name: "tar",
                args: {
                    "extract": true,
                    "file": Path("a.tar"),
                    "verbose": true,
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(
        &p,
        &["-xfb.tar"],
        expect![[r#"
            ParsedArguments {
                name: "tar",
                args: {
                    "extract": true,
                    "file": Path("b.tar"),
                    "verbose": false,
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(&p, &["-vq"], expect!["tar: Unknown flag: `-q`. Use `--help` for more information"]);
    check(&p, &["-v=yes"], expect!["tar: Flag `-v` doesn't take a value"]);
    assert_eq!(help_of(&p, &["-vh"]), p.help());
}

#[test]
fn standard_arguments() {
    let p = standard::parser();
    check(
        &p,
        &["-b", "1", "-c", "5", "7", "8", "-f"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "aarg": None,
                    "barg": 1,
                    "carg": 5,
                    "darg": None,
                    "earg": None,
                    "flag": true,
                    "parg": [7],
                    "qarg": [8],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(
        &p,
        &["7", "--bargument=2", "-c", "-d", "-e", "1", "-2", "--", "-8"],
        expect![[r#"
            ParsedArguments {
                name: "prog",
                args: {
                    "aarg": None,
                    "barg": 2,
                    "carg": None,
                    "darg": [],
                    "earg": [1, -2],
                    "flag": false,
                    "parg": [7],
                    "qarg": [-8],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(
        &p,
        &["-b", "1", "-c", "5", "7", "8", "9"],
        expect!["prog: Unexpected argument: `9`. Use `--help` for more information"],
    );
    check(
        &p,
        &["-b", "1", "-c", "5", "7"],
        expect!["prog: Argument is required: `pargument`. Use `--help` for more information"],
    );
    check(&p, &["-b", "1", "-c", "-f=yes", "7", "8"], expect!["prog: Flag `-f` doesn't take a value"]);
}

#[test]
fn positionals_share_tokens() {
    let mut p = ParserNode::new("cp");
    p.add_argument(
        "sources",
        Argument::positional("src", ValueType::list(ScalarType::Path)).arity(Arity::OneOrMore),
    )
    .unwrap()
    .add_argument("dest", Argument::positional("dst", ValueType::PATH))
    .unwrap()
    .add_argument("recursive", Argument::flag("recursive"))
    .unwrap();

    check(
        &p,
        &["a", "-r", "b", "c"],
        expect![[r#"
            ParsedArguments {
                name: "cp",
                args: {
                    "dest": Path("c"),
                    "recursive": true,
                    "sources": [Path("a"), Path("b")],
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(&p, &["a"], expect!["cp: Argument is required: `src`. Use `--help` for more information"]);
}

#[test]
fn value_syntax() {
    let mut p = ParserNode::new("plot");
    p.add_argument(
        "point",
        Argument::named("point", ValueType::tuple(ScalarType::Float)).arity(Arity::Exactly(2)),
    )
    .unwrap()
    .add_argument("labels", Argument::named("labels", ValueType::set(ScalarType::Str)).arity(Arity::ZeroOrMore))
    .unwrap()
    .add_argument("title", Argument::named("title", ValueType::STR).default("untitled"))
    .unwrap()
    .add_argument("grid", Argument::named("grid", ValueType::BOOL))
    .unwrap();

    check(
        &p,
        &["--point", "1.5", "-2", "-l", "a", "b", "a", "-gYes"],
        expect![[r#"
            ParsedArguments {
                name: "plot",
                args: {
                    "grid": true,
                    "labels": {"a", "b"},
                    "point": (1.5, -2.0),
                    "title": "untitled",
                },
                sub_name: None,
                sub: None,
            }
        "#]],
    );
    check(&p, &["-p", "1"], expect!["plot: Expected 2 value(s) for `-p`"]);
    check(&p, &["--grid", "maybe"], expect!["plot: Can't parse `--grid` as bool, invalid value `maybe`"]);
    check(&p, &["-g", "NO", "--title=x"], expect![[r#"
        ParsedArguments {
            name: "plot",
            args: {
                "grid": false,
                "labels": None,
                "point": None,
                "title": "x",
            },
            sub_name: None,
            sub: None,
        }
    "#]]);
}

#[test]
fn bool_tokens() {
    let mut p = ParserNode::new("prog");
    p.add_argument("b", Argument::positional("b", ValueType::BOOL)).unwrap();
    for (token, expected) in [("true", true), ("Yes", true), ("false", false), ("NO", false)] {
        assert_eq!(p.parse([token]).unwrap().args["b"], Value::Bool(expected));
    }
    assert!(matches!(p.parse(["y"]), Err(Error::Parse { .. })));
}

#[test]
fn negated_flags() {
    let mut p = ParserNode::new("prog");
    p.add_argument("color", Argument::flag("color").short('c').represents_true(false))
        .unwrap()
        .add_argument("pager", Argument::flag("no-pager").represents_true(false).default(Value::None))
        .unwrap();

    let parsed = p.parse(Vec::<String>::new()).unwrap();
    assert_eq!(parsed.args["color"], Value::Bool(true));
    assert_eq!(parsed.args["pager"], Value::None);

    let parsed = p.parse(["-c", "--no-pager"]).unwrap();
    assert_eq!(parsed.args["color"], Value::Bool(false));
    assert_eq!(parsed.args["pager"], Value::Bool(false));
}

#[test]
fn mapping_hooks() {
    let mut p = ParserNode::new("prog");
    p.add_argument(
        "level",
        Argument::named("level", ValueType::Custom("level"))
            .mapping(|raw| match raw[0].as_str() {
                "low" => Ok(Value::Int(1)),
                "high" => Ok(Value::Int(3)),
                other => Err(format!("unknown level `{other}`").into()),
            })
            .default(2i64)
            .on_mapping_failed(|_, _, default| default.cloned().unwrap_or(Value::None)),
    )
    .unwrap()
    .add_argument(
        "port",
        Argument::named("port", ValueType::Custom("port"))
            .mapping(|raw| Ok(Value::Int(raw[0].parse::<u16>()?.into()))),
    )
    .unwrap();

    let parsed = p.parse(["-l", "high", "-p", "8080"]).unwrap();
    assert_eq!(parsed.args["level"], Value::Int(3));
    assert_eq!(parsed.args["port"], Value::Int(8080));

    let parsed = p.parse(["-l", "medium"]).unwrap();
    assert_eq!(parsed.args["level"], Value::Int(2));
    assert_eq!(parsed.args["port"], Value::None);

    check(
        &p,
        &["-p", "80000"],
        expect!["prog: Can't parse `-p` as port, number too large to fit in target type"],
    );
}

#[test]
fn first_subcommand_name_wins() {
    let mut p = ParserNode::new("prog");
    p.add_argument("name", Argument::named("name", ValueType::STR)).unwrap();
    p.add_subparser("a", "").unwrap();
    p.add_subparser("b", "").unwrap();

    check(&p, &["--name", "b", "a"], expect!["prog: Expected 1 value(s) for `--name`"]);
    check(
        &p,
        &["--name", "x", "b", "a"],
        expect!["prog b: Unexpected argument: `a`. Use `--help` for more information"],
    );
}

#[test]
fn registration_errors() {
    let mut p = ParserNode::new("prog");
    let err =
        p.add_argument("when", Argument::named("when", ValueType::Custom("date"))).err().unwrap();
    assert_eq!(
        err.to_string(),
        "invalid command line configuration: argument `when` has type `date` which needs an explicit mapping"
    );
    let err = p.add_argument("help", Argument::flag("help")).err().unwrap();
    assert_eq!(
        err.to_string(),
        "invalid command line configuration: `--help` clashes with `-h, --help` in `prog`"
    );
    p.add_subparser("sub", "").unwrap();
    let err = p.add_subparser("sub", "").err().unwrap();
    assert_eq!(err.to_string(), "invalid command line configuration: `prog` already has a subcommand `sub`");
}

#[test]
fn positional_is_always_required() {
    let mut p = ParserNode::new("prog");
    p.add_argument("x", Argument::positional("x", ValueType::STR).required(false)).unwrap();
    assert!(p.arguments().all(|(_, arg)| arg.is_required()));
}

#[test]
fn help_standard() {
    let p = standard::parser();
    let help = p.help();
    expect![[r#"
        Usage:
           prog [-h] [-a AARG] pargument -b BARG -c [CARG] [-d [DARG ...]] [-e EARG [EARG ...]] [-f] qargument

        flags:
           -h, --help show this help message and exit
           -f, --flag

        required named arguments:
           -b, --bargument BARG
           -c, --cargument [CARG]

        optional named arguments:
           -a, --aargument AARG
           -d, --dargument [DARG ...]
           -e, --eargument EARG [EARG ...]

        positional arguments:
           pargument
           qargument
    "#]]
    .assert_eq(&help);
    assert_eq!(help, p.help());
}

#[test]
fn help_nested() {
    let p = nested::parser();
    expect![[r#"
        Usage:
           prog [-h] -a [argument] -i argument [argument ...] {sub1,sub2}

        subcommands:
           sub1
           sub2

        flags:
           -h, --help show this help message and exit

        required named arguments:
           -a, --arg      [argument]
           -i, --integers argument [argument ...]
    "#]]
    .assert_eq(&p.help());
    assert_eq!(help_of(&p, &["--help", "-a", "x"]), p.help());
    assert_eq!(help_of(&p, &["-a", "3", "-i", "1", "sub1", "-h"]), p.subparser("sub1").unwrap().help());
}

#[test]
fn help_columns() {
    let mut p = ParserNode::new("tool");
    p.add_argument(
        "files",
        Argument::positional("files", ValueType::list(ScalarType::Path))
            .display_name("FILE")
            .arity(Arity::ZeroOrMore)
            .help("inputs"),
    )
    .unwrap()
    .add_argument("depth", Argument::named("depth", ValueType::INT).display_name("N").help("max depth"))
    .unwrap()
    .add_argument("verbose", Argument::flag("verbose").help("talk more"))
    .unwrap();
    p.add_subparser("run", "Runs the tool").unwrap();
    p.add_subparser("check-all", "").unwrap();

    expect![[r#"
        Usage:
           tool [-h] [FILE ...] [-d N] [-v] {check-all,run}

        subcommands:
           check-all
           run        Runs the tool

        flags:
           -h, --help    show this help message and exit
           -v, --verbose talk more

        optional named arguments:
           -d, --depth N max depth

        positional arguments:
           files [FILE ...] inputs
    "#]]
    .assert_eq(&p.help());
}

#[test]
fn jira_invocation_chain() {
    let cli = jira::cli();
    let parsed = cli.parse(["issue", "-k", "ABC-1234", "info"]).unwrap();
    assert_eq!(parsed.path(), vec!["jira", "issue", "info"]);

    let mut invocation = cli.bind(&parsed).unwrap();
    assert_eq!(invocation.names(), vec!["jira", "issue", "info"]);
    let chain = invocation.run().unwrap();
    assert_eq!(chain.len(), 3);

    let info = chain[0].downcast_ref::<Info>().unwrap();
    let issue = chain[1].downcast_ref::<Issue>().unwrap();
    let jira = chain[2].downcast_ref::<Jira>().unwrap();
    assert!(info.called);
    assert_eq!(info.key.as_deref(), Some("ABC-1234"));
    assert_eq!(issue.issue_key.as_deref(), Some("ABC-1234"));
    assert!(!issue.called);
    assert!(!jira.called);

    let chain = invocation.chain();
    assert!(std::ptr::addr_eq(chain[2], invocation.root()));
}

#[test]
fn jira_unset_optional_argument() {
    let cli = jira::cli();
    let mut invocation = cli.run(["issue", "create"]).unwrap();
    let chain = invocation.chain();
    assert!(chain[0].downcast_ref::<Create>().unwrap().called);
    assert_eq!(chain[1].downcast_ref::<Issue>().unwrap().issue_key, None);
    assert!(!chain[1].downcast_ref::<Issue>().unwrap().called);
    assert!(!chain[2].downcast_ref::<Jira>().unwrap().called);

    // A second run invokes the leaf again.
    assert_eq!(invocation.run().unwrap().len(), 3);
    assert!(invocation.leaf().is::<Create>());
}

#[test]
fn jira_root_is_a_leaf_too() {
    let cli = jira::cli();
    let invocation = cli.run(Vec::<String>::new()).unwrap();
    assert_eq!(invocation.len(), 1);
    assert!(invocation.leaf().downcast_ref::<Jira>().unwrap().called);
}

#[test]
fn jira_command_failure() {
    let cli = jira::cli();
    let err = cli.run(["issue", "create", "--summary", ""]).err().unwrap();
    assert!(matches!(err, Error::Command(_)));
    assert_eq!(err.to_string(), "summary can't be empty");
}

#[test]
fn jira_help() {
    let cli = jira::cli();
    let issue = cli.parser().subparser("issue").unwrap();
    let create = issue.subparser("create").unwrap();

    expect![[r#"
        Usage:
           jira [-h] {issue}

        subcommands:
           issue

        flags:
           -h, --help show this help message and exit
    "#]]
    .assert_eq(&cli.help());
    expect![[r#"
        Usage:
           issue [-h] [-k key] {create,info}

        subcommands:
           create  Creates new ticket
           info    Shows info to the given ticket.

        flags:
           -h, --help show this help message and exit

        optional named arguments:
           -k, --key key Issue key, e.g. ABC-1234
    "#]]
    .assert_eq(&issue.help());
    expect![[r#"
        Usage:
           create [-h] [-s summary]

        flags:
           -h, --help show this help message and exit

        optional named arguments:
           -s, --summary summary
    "#]]
    .assert_eq(&create.help());

    let cases: [(&[&str], &ParserNode); 5] = [
        (&["-h"][..], cli.parser()),
        (&["issue", "-h"][..], issue),
        (&["issue", "create", "-h"][..], create),
        (&["-h", "issue", "create", "-h"][..], cli.parser()),
        (&["issue", "-h", "create", "-h"][..], issue),
    ];
    for (args, level) in cases {
        assert_eq!(help_of(cli.parser(), args), level.help(), "{args:?}");
        let err = cli.run(args.iter().copied()).err().unwrap();
        assert!(err.is_help());
    }
}

#[test]
fn binding_errors() {
    let cli = jira::cli();
    let mut parsed = cli.parse(["issue", "info"]).unwrap();
    parsed.sub.as_mut().unwrap().sub_name = Some("delete".to_string());
    let err = cli.bind(&parsed).err().unwrap();
    assert_eq!(err.to_string(), "can't bind parsed arguments: `issue` has no subcommand `delete`");

    let mut parsed = cli.parse(["issue"]).unwrap();
    parsed.sub.as_mut().unwrap().args.insert("issue_key".to_string(), Value::Int(1));
    let err = cli.bind(&parsed).err().unwrap();
    assert_eq!(
        err.to_string(),
        "can't bind parsed arguments: `issue_key` holds a int value (1) of an unexpected type"
    );
}

#[test]
fn repl_session() {
    let cli = jira::cli();
    let repl = Repl::new(&cli, ReplSettings { prompt: Some("> ".to_string()), show_tokens: true });
    let mut input = Cursor::new("issue -k \"ABC 1\" info\n?\nissue --bogus\n\nexit\nissue\n");
    let mut out = Vec::new();
    repl.run(&mut input, &mut out).unwrap();

    expect![[r#"
        jira
        > ["issue", "-k", "ABC 1", "info"]
        > ["?"]
        Available Subcommands
           issue

        Arguments
        > ["issue", "--bogus"]
        jira issue: Unknown flag: `--bogus`. Use `--help` for more information
        > []
        > ["exit"]
    "#]]
    .assert_eq(&String::from_utf8(out).unwrap());
}

#[test]
fn repl_describes_arguments() {
    let def = jira::def().argument("dry_run", Argument::flag("dry-run")).description("Jira client");
    let cli = argtree::Cli::new(def).unwrap();
    let mut input = Cursor::new("help\n");
    let mut out = Vec::new();
    Repl::new(&cli, ReplSettings::default()).run(&mut input, &mut out).unwrap();

    expect![[r#"
        jira
        (jira) >: Jira client

        Available Subcommands
           issue

        Arguments
           Flags
              -d, --dry-run
        (jira) >: "#]]
    .assert_eq(&String::from_utf8(out).unwrap());
}

struct Strict;

impl Command for Strict {
    fn call(&mut self, _: &Lineage<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn run_or_exit_returns_programmer_errors() {
    let def = CommandDef::new("strict", |args| {
        let _: i64 = args.get("name")?;
        Ok(Strict)
    })
    .argument("name", Argument::named("name", ValueType::STR).default("x"));
    let cli = Cli::new(def).unwrap();

    let err = cli.run_or_exit(["-n", "y"]).err().unwrap();
    assert!(matches!(err, Error::Binding(_)), "{err}");
}

const EXIT_ARGS: &str = "ARGTREE_EXIT_ARGS";

/// Runs `jira` with the tokens in `EXIT_ARGS` and lets it exit the process.
/// Does nothing when the variable is unset.
#[test]
fn jira_run_or_exit() {
    let Ok(line) = std::env::var(EXIT_ARGS) else { return };
    let _ = jira::cli().run_or_exit(split_line(&line));
}

fn run_jira_process(line: &str) -> assert_cmd::assert::Assert {
    let exe = std::env::current_exe().unwrap();
    assert_cmd::Command::new(exe)
        .args(["jira_run_or_exit", "--exact", "--nocapture", "--quiet", "--test-threads=1"])
        .env(EXIT_ARGS, line)
        .assert()
}

#[test]
fn help_exits_with_success() {
    let cli = jira::cli();
    let help = cli.parser().subparser("issue").unwrap().help();
    run_jira_process("issue -h").code(0).stdout(predicate::str::ends_with(help));
    run_jira_process("-h issue").code(0).stdout(predicate::str::ends_with(cli.help()));
}

#[test]
fn bad_input_exits_with_failure() {
    run_jira_process("--bogus").code(2).stderr(predicate::str::contains(
        "jira: Unknown flag: `--bogus`. Use `--help` for more information\n",
    ));
    run_jira_process("issue create --summary \"\"")
        .code(2)
        .stderr(predicate::str::contains("summary can't be empty\n"));
}
