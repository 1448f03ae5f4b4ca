use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::{Builder, Target};
use log::{debug, info, LevelFilter};

use minipy as py;

use py::ast_printer::AstPrinter;
use py::error::PyError;
use py::interpreter::Interpreter;
use py::parser::Parser;
use py::scanner::Scanner;
use py::token::Token;

/// Exit status for lexical, syntactic and static-analysis errors.
const EXIT_STATIC: i32 = 65;

/// Exit status for runtime errors.
const EXIT_RUNTIME: i32 = 1;

#[derive(ClapParser, Debug)]
#[command(version, about = "Interpreter for the minipy language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Write a debug trace to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream of a source file, one token per line
    Tokenize { filename: Option<PathBuf> },

    /// Print the syntax tree of a source file
    Parse {
        filename: Option<PathBuf>,

        /// Emit JSON instead of S-expressions
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a source file holding a single expression and print its value
    Evaluate { filename: Option<PathBuf> },

    /// Execute a source file as a program
    Run { filename: Option<PathBuf> },
}

/// Loads a script as UTF-8 text.
fn read_source(path: &Path) -> Result<String> {
    info!("Loading source from {:?}", path);

    let file = File::open(path).context(format!("Failed to open file {:?}", path))?;
    let mut bytes: Vec<u8> = Vec::new();

    let n = BufReader::new(file)
        .read_to_end(&mut bytes)
        .context(format!("Failed to read file {:?}", path))?;

    debug!("Loaded {} bytes", n);

    let source = String::from_utf8(bytes)
        .map_err(PyError::from)
        .context(format!("File {:?} is not valid UTF-8", path))?;

    Ok(source)
}

/// Sends `[module:line] - message` records to app.log.
fn init_file_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let path: &str = record.module_path().unwrap_or("<unnamed>");
            let module: &str = path.strip_prefix("minipy::").unwrap_or(path);

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(log_file)))
        .filter(None, LevelFilter::Debug)
        .init();

    info!("Logging to app.log");

    Ok(())
}

/// Writes the diagnostic for `err` to stderr and picks the exit status.
fn report(err: &PyError) -> i32 {
    debug!("Reporting {:?}", err);

    match err {
        PyError::Exit { code } => *code,

        e if e.is_static() => {
            eprintln!("{}", e);
            EXIT_STATIC
        }

        PyError::Runtime { .. } => {
            eprintln!("RuntimeError: {}", err);
            EXIT_RUNTIME
        }

        other => {
            eprintln!("{}", other);
            EXIT_RUNTIME
        }
    }
}

/// Scans the whole source, stopping at the first lexical error.
fn scan(source: &str) -> Result<Vec<Token<'_>>, PyError> {
    Scanner::new(source).collect()
}

fn tokenize(source: &str) -> i32 {
    let mut status: i32 = 0;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => println!("{}", token),

            Err(e) => {
                debug!("Lex error: {}", e);

                eprintln!("{}", e);
                status = EXIT_STATIC;
            }
        }
    }

    status
}

fn parse(source: &str, json: bool) -> Result<i32> {
    let program = match scan(source).and_then(|tokens| Parser::new(&tokens).parse()) {
        Ok(program) => program,
        Err(e) => return Ok(report(&e)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        println!("{}", AstPrinter::print_program(&program));
    }

    Ok(0)
}

fn evaluate(source: &str) -> i32 {
    let expr = match scan(source).and_then(|tokens| Parser::new(&tokens).parse_expression()) {
        Ok(expr) => expr,
        Err(e) => return report(&e),
    };

    match Interpreter::new().evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            0
        }

        Err(e) => report(&e),
    }
}

fn run(source: &str) -> i32 {
    let mut interpreter = Interpreter::new();

    match py::run(&mut interpreter, source) {
        Ok(()) => {
            info!("Program finished");
            0
        }

        Err(e) => report(&e),
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_file_logger()?;
    } else {
        // Silence the log facade entirely.
        Builder::new().filter_level(LevelFilter::Off).init();
    }

    debug!("{:?}", args);

    let (name, filename) = match &args.commands {
        Commands::Tokenize { filename } => ("tokenize", filename),
        Commands::Parse { filename, .. } => ("parse", filename),
        Commands::Evaluate { filename } => ("evaluate", filename),
        Commands::Run { filename } => ("run", filename),
    };

    let Some(filename) = filename else {
        info!("No filepath provided for {}", name);

        println!("No input filepath was provided. Exiting...");

        return Ok(());
    };

    let source: String = read_source(filename)?;

    info!("Running {} on {:?}", name, filename);

    let status: i32 = match args.commands {
        Commands::Tokenize { .. } => tokenize(&source),
        Commands::Parse { json, .. } => parse(&source, json)?,
        Commands::Evaluate { .. } => evaluate(&source),
        Commands::Run { .. } => run(&source),
    };

    if status != 0 {
        debug!("Exiting with status {}", status);

        process::exit(status);
    }

    Ok(())
}
