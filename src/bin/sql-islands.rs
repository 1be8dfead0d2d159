//! Command-line interface for sql-islands
//! Runs the extraction pipeline over a script and prints one view of the
//! result to stdout.
//!
//! Usage:
//!   sql-islands tokens `<path>`    - Classified token stream as JSON
//!   sql-islands tree `<path>`      - Hierarchical parse-tree dump
//!   sql-islands scope `<path>`     - Source with out-of-scope text blanked
//!   sql-islands errors `<path>`    - Gathered faults as JSON
//!   sql-islands profile `<path>`   - Per-rule parse profile
//!
//! `<path>` may be `-` to read from stdin.

use clap::{Arg, ArgAction, Command};
use sql_islands::islands::document::{Document, DocumentOptions};
use sql_islands::islands::render::tree_text;
use sql_islands::islands::scope::project_scope;
use sql_islands::islands::Dialect;
use std::io::Read;

fn input_arg() -> Arg {
    Arg::new("path")
        .help("Path to the script to process, or - for stdin")
        .required(true)
        .index(1)
}

fn option_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("dialect")
            .long("dialect")
            .value_parser(["generic", "oracledb", "postgresql"])
            .help("Override dialect detection"),
    )
    .arg(
        Arg::new("no-hide")
            .long("no-hide")
            .action(ArgAction::SetTrue)
            .help("Skip scope classification; all tokens stay visible"),
    )
    .arg(
        Arg::new("no-embed")
            .long("no-embed")
            .action(ArgAction::SetTrue)
            .help("Skip embedded-code resolution"),
    )
    .arg(
        Arg::new("remove-literal")
            .long("remove-literal")
            .action(ArgAction::SetTrue)
            .help("Detach the body literal of resolved embedded code"),
    )
}

fn main() {
    let matches = Command::new("sql-islands")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts and parses islands of SQL embedded in scripts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(option_args(
            Command::new("tokens")
                .about("Print the classified token stream as JSON")
                .arg(input_arg()),
        ))
        .subcommand(option_args(
            Command::new("tree")
                .about("Print the parse tree")
                .arg(input_arg()),
        ))
        .subcommand(option_args(
            Command::new("scope")
                .about("Print the source with out-of-scope text blanked")
                .arg(input_arg()),
        ))
        .subcommand(option_args(
            Command::new("errors")
                .about("Print the gathered faults as JSON")
                .arg(input_arg()),
        ))
        .subcommand(option_args(
            Command::new("profile")
                .about("Print the per-rule parse profile")
                .arg(input_arg()),
        ))
        .get_matches();

    let (name, sub) = matches.subcommand().expect("subcommand is required");

    let path = sub.get_one::<String>("path").expect("path is required");
    let sql = match read_input(path) {
        Ok(sql) => sql,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let options = DocumentOptions {
        hide_out_of_scope_tokens: !sub.get_flag("no-hide"),
        dialect: sub.get_one::<String>("dialect").map(|d| match d.as_str() {
            "oracledb" => Dialect::OracleDb,
            "postgresql" => Dialect::PostgreSql,
            _ => Dialect::Generic,
        }),
        profile: name == "profile",
        embed_subtrees: !sub.get_flag("no-embed"),
        remove_embedded_literal: sub.get_flag("remove-literal"),
    };
    let doc = Document::build(&sql, &options);

    match name {
        "tokens" => match serde_json::to_string_pretty(doc.tokens()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize tokens: {}", e);
                std::process::exit(1);
            }
        },
        "tree" => print!("{}", tree_text(doc.tree())),
        "scope" => print!("{}", project_scope(doc.tokens())),
        "errors" => match serde_json::to_string_pretty(doc.syntax_errors()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize errors: {}", e);
                std::process::exit(1);
            }
        },
        "profile" => print!("{}", doc.parser_metrics().profile_report()),
        _ => unreachable!("subcommand is validated by clap"),
    }

    if !doc.syntax_errors().is_empty() {
        if name != "errors" {
            for error in doc.syntax_errors() {
                eprintln!("{}", error);
            }
        }
        std::process::exit(2);
    }
}

fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut sql = String::new();
        std::io::stdin().read_to_string(&mut sql)?;
        Ok(sql)
    } else {
        std::fs::read_to_string(path)
    }
}
