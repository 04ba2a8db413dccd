pub mod asm;
pub mod codegen;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod tac;

use crate::error::CompileError;
use crate::symbol_table::SymbolTable;
use crate::tac::Instruction;
use tracing::debug;

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub instructions: Vec<Instruction>,
    pub symbols: SymbolTable,
}

impl Compilation {
    pub fn new(instructions: Vec<Instruction>, symbols: SymbolTable) -> Self {
        Self {
            instructions,
            symbols,
        }
    }

    /// Canonical TAC text, the form handed to downstream consumers.
    pub fn tac(&self) -> String {
        tac::render(&self.instructions)
    }

    pub fn pretty(&self) -> String {
        tac::render_pretty(&self.instructions)
    }
}

fn compile_helper(source: &str) -> Result<Compilation, CompileError> {
    let tokens = lexer::Lexer::new(source).scan()?;
    debug!(tokens = tokens.len(), "scanned source");
    let parser = parser::Parser::new(tokens.into_iter());
    parser.parse()
}

/// Lexes, checks and lowers `source` to three-address code. The first error
/// aborts the compilation.
pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    debug!(bytes = source.len(), "compiling");
    let compilation = compile_helper(source)?;
    debug!(
        instructions = compilation.instructions.len(),
        symbols = compilation.symbols.len(),
        "compiled"
    );
    Ok(compilation)
}
