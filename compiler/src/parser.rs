use crate::codegen::CodeGen;
use crate::error::{CompileError, SemanticError, SyntaxError};
use crate::expr::ExprValue;
use crate::lexer::{Token, TokenType};
use crate::symbol_table::{DataType, Symbol, SymbolTable, Value};
use crate::tac::{BinaryOp, Instruction, Operand, Place};
use crate::Compilation;
use std::iter::Peekable;

macro_rules! next_eq {
    ( $parser: ident, $( $x: expr ), *) => {
        {
            let token = $parser.cursor.next_if(|t| $(t.kind == $x) || *);
            if let Some(token) = &token {
                $parser.line = token.line;
            }
            token
        }
    };
}

type ParseResult<T> = Result<T, CompileError>;

/// Single-pass parser that checks declarations and types, folds constant
/// values and emits three-address code while it descends.
pub struct Parser<T: Iterator<Item = Token>> {
    cursor: Peekable<T>,
    symbols: SymbolTable,
    codegen: CodeGen,
    line: usize,
}

impl<T: Iterator<Item = Token>> Parser<T> {
    pub fn new(tokens: T) -> Parser<T> {
        Parser {
            cursor: tokens.peekable(),
            symbols: SymbolTable::new(),
            codegen: CodeGen::new(),
            line: 0,
        }
    }

    /// program := statement*
    pub fn parse(mut self) -> ParseResult<Compilation> {
        while !self.peek_check(TokenType::Eof) {
            self.statement()?;
        }
        Ok(Compilation::new(self.codegen.finish(), self.symbols))
    }

    fn peek_kind(&mut self) -> Option<TokenType> {
        self.cursor.peek().map(|token| token.kind.clone())
    }

    fn peek_check(&mut self, expected: TokenType) -> bool {
        self.cursor
            .peek()
            .map_or(false, |token| token.kind == expected)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.cursor.next()?;
        self.line = token.line;
        Some(token)
    }

    fn consume(&mut self, expected: TokenType) -> ParseResult<Token> {
        match self.cursor.next_if(|t| t.kind == expected) {
            Some(token) => {
                self.line = token.line;
                Ok(token)
            }
            None => Err(self.error(&expected.to_string())),
        }
    }

    fn consume_identifier(&mut self) -> ParseResult<(String, usize)> {
        match self.cursor.next_if(Token::is_identifier) {
            Some(Token {
                kind: TokenType::Identifier(name),
                line,
                ..
            }) => {
                self.line = line;
                Ok((name, line))
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn consume_type(&mut self) -> ParseResult<DataType> {
        let ty = match self.peek_kind() {
            Some(TokenType::Int) => DataType::Int,
            Some(TokenType::Float) => DataType::Float,
            Some(TokenType::String) => DataType::Str,
            _ => return Err(self.error("type keyword")),
        };
        self.advance();
        Ok(ty)
    }

    fn error(&mut self, expected: &str) -> CompileError {
        let line = self.line;
        let (found, line) = self
            .cursor
            .peek()
            .map_or((TokenType::Eof.to_string(), line), |token| {
                (token.kind.to_string(), token.line)
            });
        SyntaxError::UnexpectedToken {
            expected: expected.into(),
            found,
            line,
        }
        .into()
    }

    /// statement := declaration | assignment | controlStmt | returnStmt | block
    fn statement(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            Some(TokenType::Int | TokenType::Float | TokenType::String) => {
                self.declaration()
            }
            Some(TokenType::Identifier(_)) => self.assignment_stmt(),
            Some(TokenType::If | TokenType::While | TokenType::For) => {
                self.control_stmt()
            }
            Some(TokenType::Return) => self.return_stmt(),
            Some(TokenType::LeftBrace) => self.block(),
            _ => Err(self.error("statement")),
        }
    }

    /// block := '{' statement* '}'
    fn block(&mut self) -> ParseResult<()> {
        self.consume(TokenType::LeftBrace)?;
        while !self.peek_check(TokenType::RightBrace)
            && !self.peek_check(TokenType::Eof)
        {
            self.statement()?;
        }
        self.consume(TokenType::RightBrace)?;
        Ok(())
    }

    /// declaration := TYPE ID ('=' expr)? ';'
    ///
    /// The declared type is stamped over whatever type the initializer
    /// evaluated to.
    fn declaration(&mut self) -> ParseResult<()> {
        let ty = self.consume_type()?;
        let (name, line) = self.consume_identifier()?;
        let init = if next_eq!(self, TokenType::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        let (value, reference) = match init {
            Some(init) => (Some(init.value), Some(init.reference)),
            None => (None, None),
        };
        self.symbols.declare(Symbol::new(&name, ty, value), line)?;
        self.consume(TokenType::Semicolon)?;
        if let Some(value) = reference {
            self.codegen.emit(Instruction::Assign {
                dest: Place::Symbol(name),
                value,
            });
        }
        Ok(())
    }

    fn assignment_stmt(&mut self) -> ParseResult<()> {
        let instruction = self.assignment()?;
        self.consume(TokenType::Semicolon)?;
        self.codegen.emit(instruction);
        Ok(())
    }

    /// assignment := ID ( '++' | '--' | '=' expr )
    ///
    /// Instructions of the right-hand side are emitted as they are parsed;
    /// the final store is returned so the caller decides where it goes.
    fn assignment(&mut self) -> ParseResult<Instruction> {
        let (name, line) = self.consume_identifier()?;
        let symbol = self.symbols.lookup(&name, line)?.clone();
        if let Some(oper) = next_eq!(self, TokenType::Plus, TokenType::Minus)
        {
            self.consume(oper.kind.clone())?;
            let op = if oper.kind == TokenType::Plus {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            return self.step(symbol, op, oper.line);
        }
        self.consume(TokenType::Equal)?;
        let value = self.expression()?;
        if value.ty != symbol.ty {
            return Err(
                SemanticError::type_mismatch("=", symbol.ty, value.ty, line)
                    .into(),
            );
        }
        self.symbols
            .update(Symbol::new(&name, symbol.ty, Some(value.value)), line)?;
        Ok(Instruction::Assign {
            dest: Place::Symbol(name),
            value: value.reference,
        })
    }

    /// `x++` / `x--`: folded in place, stored as `x = x + 1` without a
    /// temporary.
    fn step(
        &mut self,
        symbol: Symbol,
        op: BinaryOp,
        line: usize,
    ) -> ParseResult<Instruction> {
        let current = match symbol.value {
            Some(value) => value,
            None => {
                return Err(SemanticError::UndefinedValue {
                    name: symbol.name,
                    line,
                }
                .into())
            }
        };
        let next = match current {
            Value::Int(num) if symbol.ty != DataType::Str => match op {
                BinaryOp::Add => num.wrapping_add(1),
                _ => num.wrapping_sub(1),
            },
            _ => {
                return Err(SemanticError::type_mismatch(
                    op,
                    DataType::Str,
                    DataType::Int,
                    line,
                )
                .into())
            }
        };
        self.symbols.update(
            Symbol::new(&symbol.name, symbol.ty, Some(Value::Int(next))),
            line,
        )?;
        Ok(Instruction::Binary {
            dest: Place::Symbol(symbol.name.clone()),
            left: Operand::Symbol(symbol.name),
            op,
            right: Operand::Literal(Value::Int(1)),
        })
    }

    /// controlStmt := ('if'|'while'|'for') '(' ... ')' statement ('else' statement)?
    fn control_stmt(&mut self) -> ParseResult<()> {
        let keyword = self.advance().map(|token| token.kind);
        self.consume(TokenType::LeftParen)?;
        if keyword == Some(TokenType::For) {
            self.for_init()?;
        }

        let loop_start = if keyword == Some(TokenType::If) {
            None
        } else {
            let label = self.codegen.new_label();
            self.codegen.emit(Instruction::Label(label));
            Some(label)
        };

        let condition = self.expression()?;
        let true_label = self.codegen.new_label();
        let false_label = self.codegen.new_label();
        self.codegen.emit(Instruction::CondGoto {
            condition: condition.reference,
            target: true_label,
        });
        self.codegen.emit(Instruction::Goto(false_label));
        self.codegen.emit(Instruction::Label(true_label));

        // The iterator's temporaries are emitted in place; only its final
        // store is held until after the body.
        let iterator = if keyword == Some(TokenType::For) {
            self.consume(TokenType::Semicolon)?;
            if self.peek_check(TokenType::RightParen) {
                None
            } else {
                Some(self.assignment()?)
            }
        } else {
            None
        };
        self.consume(TokenType::RightParen)?;

        self.statement()?;
        if let Some(instruction) = iterator {
            self.codegen.emit(instruction);
        }

        match loop_start {
            Some(start) => {
                self.codegen.emit(Instruction::Goto(start));
                self.codegen.emit(Instruction::Label(false_label));
            }
            None if next_eq!(self, TokenType::Else).is_some() => {
                let join_label = self.codegen.new_label();
                self.codegen.emit(Instruction::Goto(join_label));
                self.codegen.emit(Instruction::Label(false_label));
                self.statement()?;
                self.codegen.emit(Instruction::Label(join_label));
            }
            None => self.codegen.emit(Instruction::Label(false_label)),
        }
        Ok(())
    }

    fn for_init(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            Some(TokenType::Int | TokenType::Float | TokenType::String) => {
                self.declaration()
            }
            Some(TokenType::Identifier(_)) => self.assignment_stmt(),
            Some(TokenType::Semicolon) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error("declaration, assignment or ';'")),
        }
    }

    /// returnStmt := 'return' expr ';'
    fn return_stmt(&mut self) -> ParseResult<()> {
        self.consume(TokenType::Return)?;
        let value = self.expression()?;
        self.consume(TokenType::Semicolon)?;
        self.codegen.emit(Instruction::Return(value.reference));
        Ok(())
    }

    /// expr := term (('+'|'-') term)* ('>' expr)?
    fn expression(&mut self) -> ParseResult<ExprValue> {
        let mut expr = self.term()?;
        while let Some(oper) = next_eq!(self, TokenType::Plus, TokenType::Minus)
        {
            let right = self.term()?;
            let op = if oper.kind == TokenType::Plus {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            expr = self.binary(expr, op, right, oper.line)?;
        }
        if let Some(oper) = next_eq!(self, TokenType::Greater) {
            let right = self.expression()?;
            expr = self.binary(expr, BinaryOp::Greater, right, oper.line)?;
        }
        Ok(expr)
    }

    /// term := factor (('*'|'/') factor)*
    fn term(&mut self) -> ParseResult<ExprValue> {
        let mut expr = self.factor()?;
        while let Some(oper) = next_eq!(self, TokenType::Star, TokenType::Slash)
        {
            let right = self.factor()?;
            let op = if oper.kind == TokenType::Star {
                BinaryOp::Mul
            } else {
                BinaryOp::Div
            };
            expr = self.binary(expr, op, right, oper.line)?;
        }
        Ok(expr)
    }

    /// factor := NUMBER | IDENT | STRING | '(' expr ')'
    fn factor(&mut self) -> ParseResult<ExprValue> {
        match self.peek_kind() {
            Some(TokenType::Number(num)) => {
                self.advance();
                Ok(ExprValue::literal(Value::Int(num)))
            }
            Some(TokenType::StringLiteral(text)) => {
                self.advance();
                Ok(ExprValue::literal(Value::Str(text)))
            }
            Some(TokenType::Identifier(_)) => {
                let (name, line) = self.consume_identifier()?;
                let symbol = self.symbols.lookup(&name, line)?;
                let value = symbol.value.clone().ok_or_else(|| {
                    SemanticError::UndefinedValue {
                        name: name.clone(),
                        line,
                    }
                })?;
                Ok(ExprValue::symbol(&name, symbol.ty, value))
            }
            Some(TokenType::LeftParen) => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.error("expression")),
        }
    }

    /// Checks and folds one operator application and materializes it into a
    /// fresh temporary.
    fn binary(
        &mut self,
        left: ExprValue,
        op: BinaryOp,
        right: ExprValue,
        line: usize,
    ) -> ParseResult<ExprValue> {
        if left.ty != right.ty {
            return Err(
                SemanticError::type_mismatch(op, left.ty, right.ty, line).into()
            );
        }
        let value = fold(&left, op, &right, line)?;
        let temp = self.codegen.new_temp();
        self.codegen.emit(Instruction::Binary {
            dest: Place::Temp(temp),
            left: left.reference,
            op,
            right: right.reference,
        });
        Ok(ExprValue {
            ty: left.ty,
            value,
            reference: Operand::Temp(temp),
        })
    }
}

/// Compile-time value of `left op right`. Comparisons are never evaluated
/// and carry the left operand's value forward.
fn fold(
    left: &ExprValue,
    op: BinaryOp,
    right: &ExprValue,
    line: usize,
) -> Result<Value, SemanticError> {
    match (op, left.ty) {
        (BinaryOp::Greater, _) => Ok(left.value.clone()),
        (BinaryOp::Add, DataType::Str) => {
            Ok(Value::Str(format!("{}{}", left.value, right.value)))
        }
        (_, DataType::Str) => Err(SemanticError::type_mismatch(
            op,
            DataType::Str,
            DataType::Str,
            line,
        )),
        _ => match (&left.value, &right.value) {
            (Value::Int(_), Value::Int(0)) if op == BinaryOp::Div => {
                Err(SemanticError::DivisionByZero { line })
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                BinaryOp::Add => a.wrapping_add(*b),
                BinaryOp::Sub => a.wrapping_sub(*b),
                BinaryOp::Mul => a.wrapping_mul(*b),
                _ => a.wrapping_div(*b),
            })),
            (l, r) => {
                Err(SemanticError::type_mismatch(op, l.ty(), r.ty(), line))
            }
        },
    }
}
