use crate::symbol_table::DataType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Lex Error: Unexpected character '{character}' at line {line}.")]
    UnexpectedCharacter { character: char, line: usize },
    #[error("Lex Error: Unterminated string literal starting at line {line}.")]
    UnterminatedString { line: usize },
    #[error("Lex Error: Integer literal '{lexeme}' is out of range at line {line}.")]
    InvalidNumber { lexeme: String, line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Syntax Error: Expected {expected} but found {found} at line {line}.")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("Semantic Error: Variable '{name}' is already declared at line {line}.")]
    DuplicateDeclaration { name: String, line: usize },
    #[error("Semantic Error: Variable '{name}' is not declared at line {line}.")]
    UndeclaredVariable { name: String, line: usize },
    #[error("Semantic Error: '{name}' has value undefined at line {line}.")]
    UndefinedValue { name: String, line: usize },
    #[error("Type Error: Operation '{operator}' cannot be applied between type '{left}' and '{right}' at line {line}.")]
    TypeMismatch {
        operator: String,
        left: DataType,
        right: DataType,
        line: usize,
    },
    #[error("Semantic Error: Division by zero at line {line}.")]
    DivisionByZero { line: usize },
}

impl SemanticError {
    pub fn type_mismatch(
        operator: impl std::fmt::Display,
        left: DataType,
        right: DataType,
        line: usize,
    ) -> Self {
        SemanticError::TypeMismatch {
            operator: operator.to_string(),
            left,
            right,
            line,
        }
    }
}

/// First failure of a compilation. Nothing is emitted once one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::Lex(
                LexError::UnexpectedCharacter { line, .. }
                | LexError::UnterminatedString { line }
                | LexError::InvalidNumber { line, .. },
            ) => *line,
            CompileError::Syntax(SyntaxError::UnexpectedToken { line, .. }) => {
                *line
            }
            CompileError::Semantic(
                SemanticError::DuplicateDeclaration { line, .. }
                | SemanticError::UndeclaredVariable { line, .. }
                | SemanticError::UndefinedValue { line, .. }
                | SemanticError::TypeMismatch { line, .. }
                | SemanticError::DivisionByZero { line },
            ) => *line,
        }
    }
}

/// A line of TAC text that fits none of the instruction shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TacParseError {
    #[error("Malformed three-address instruction: '{0}'")]
    Malformed(String),
    #[error("Unknown operator '{operator}' in '{line}'")]
    UnknownOperator { operator: String, line: String },
}

