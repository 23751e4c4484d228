mod report;

use clap::Parser;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse sonata expressions into their canonical AST.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Expression to parse; read from stdin if neither this nor --file is given
    expression: Option<String>,

    /// Read the expression from a file
    #[arg(short, long, conflicts_with = "expression")]
    file: Option<PathBuf>,

    /// Collect errors and print a best-effort AST instead of aborting
    /// on the first one
    #[arg(short, long)]
    recover: bool,

    /// Print the AST on a single line
    #[arg(short, long)]
    compact: bool,
}

fn main() -> ExitCode {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().filter_or("LOG", "sonata=info")).init();

    let cli = Cli::parse();
    let code = match source(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    run(&cli, &code)
}

fn source(cli: &Cli) -> io::Result<String> {
    match (&cli.expression, &cli.file) {
        (Some(expression), _) => Ok(expression.clone()),
        (None, Some(path)) => std::fs::read_to_string(path),
        (None, None) => {
            let mut code = String::new();
            io::stdin().lock().read_to_string(&mut code)?;
            Ok(code)
        }
    }
}

fn run(cli: &Cli, code: &str) -> ExitCode {
    if cli.recover {
        match sonata_syn::parse_recover(code) {
            Ok((ast, errors)) => {
                log::debug!("recovered parse with {} error(s)", errors.len());
                print_ast(&ast, cli.compact);
                for err in &errors {
                    print_report(code, err);
                }
                if errors.is_empty() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(3)
                }
            }
            Err(err) => {
                print_report(code, &err);
                ExitCode::from(3)
            }
        }
    } else {
        match sonata_syn::parse(code) {
            Ok(ast) => {
                print_ast(&ast, cli.compact);
                ExitCode::SUCCESS
            }
            Err(err) => {
                print_report(code, &err);
                ExitCode::from(3)
            }
        }
    }
}

fn print_ast(ast: &sonata_syn::Expr, compact: bool) {
    let out = if compact {
        serde_json::to_string(ast)
    } else {
        serde_json::to_string_pretty(ast)
    };
    match out {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn print_report(code: &str, err: &sonata_syn::Error) {
    let report = report::report(code, err);
    let paint: fn(report::Color, String) -> String = if atty::is(atty::Stream::Stderr) {
        |color, text| color.ansi(text)
    } else {
        |_, text| text
    };
    eprintln!("Error: {}", report.message);
    if let Some(block) = report.to_block(code, paint) {
        eprintln!("{}[{}]", block.prologue(), "<query>");
        eprintln!("{}{}", block, block.epilogue());
    }
}
