use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::Path;
use sugarml_parser::Options;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sugarml")]
#[command(about = "SugarML lexer and parser")]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a .sml file as JSON
    Tokens {
        /// Input file
        path: String,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the document tree of a .sml file as JSON
    Parse {
        /// Input file
        path: String,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check a .sml file for errors without printing anything
    Check {
        /// Input file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Tokens { path, pretty } => cmd_tokens(&path, pretty),
        Command::Parse { path, pretty } => cmd_parse(&path, pretty),
        Command::Check { path } => cmd_check(&path),
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "sugarml=warn,sugarml_lexer=warn,sugarml_parser=warn",
        1 => "sugarml=debug,sugarml_lexer=debug,sugarml_parser=debug",
        _ => "sugarml=trace,sugarml_lexer=trace,sugarml_parser=trace",
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => {
            tracing::debug!(path, bytes = source.len(), "read source");
            source
        }
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn options_for(path: &str) -> Options {
    Options::new().with_filename(path)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tokens(path: &str, pretty: bool) {
    let source = read_source(path);

    match sugarml_lexer::lex(&source, &options_for(path)) {
        Ok(tokens) => print_json(&tokens, pretty),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_parse(path: &str, pretty: bool) {
    let source = read_source(path);

    match sugarml_parser::parse_source(&source, &options_for(path)) {
        Ok(nodes) => print_json(&nodes, pretty),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: &str) {
    let source = read_source(path);

    if let Err(e) = sugarml_parser::parse_source(&source, &options_for(path)) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}
