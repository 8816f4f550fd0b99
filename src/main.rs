//! CLI tool to check and inspect slsh scripts.

use std::fs;
use std::process::ExitCode;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn usage() -> ExitCode {
    eprintln!("Usage: slsh [--verbose] <command> [files...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  check  Parse script(s) and report syntax errors");
    eprintln!("  ast    Parse script(s) and print their AST");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  slsh check build.slsh");
    eprintln!("  slsh --verbose ast build.slsh");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let verbose = args.first().is_some_and(|a| a == "--verbose" || a == "-v");
    if verbose {
        args.remove(0);
        TermLogger::init(
            LevelFilter::Trace,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )
        .unwrap_or_else(|err| eprintln!("logging unavailable: {err}"));
    }

    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        return usage();
    }

    let command = args[0].as_str();
    let files = &args[1..];

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match command {
            "check" => match slsh_syntax::parse_program(path, &content) {
                Ok(nodes) => {
                    eprintln!("{path}: valid ({} statement(s))", nodes.len());
                }
                Err(e) => {
                    eprintln!("{e}");
                    had_error = true;
                }
            },
            "ast" => match slsh_syntax::parse_program(path, &content) {
                Ok(nodes) => {
                    for node in nodes {
                        println!("{node:#?}");
                    }
                }
                Err(e) => {
                    eprintln!("{e}");
                    had_error = true;
                }
            },
            _ => {
                eprintln!("Unknown command: {command}");
                return ExitCode::from(2);
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
