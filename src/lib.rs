pub mod ast_printer;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Result;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;
use stmt::Program;
use token::Token;

/// Scan, parse and statically check a whole program.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens: Vec<Token> = Scanner::new(source).collect::<Result<_>>()?;
    let program: Program = Parser::new(&tokens).parse()?;

    Resolver::new().resolve(&program)?;

    Ok(program)
}

/// Parse `source` and execute it on `interpreter`.
pub fn run(interpreter: &mut Interpreter, source: &str) -> Result<()> {
    let program: Program = parse_program(source)?;

    interpreter.interpret(&program)
}
