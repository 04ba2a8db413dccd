//! Three-address code: the instruction set produced by the parser and the
//! canonical one-instruction-per-line text format built from it.

use crate::error::TacParseError;
use crate::symbol_table::Value;
use std::fmt;
use std::str::FromStr;

/// Compiler-generated single-assignment name, rendered `t<n>`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Branch target, rendered `L<n>`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Where the runtime value of an expression lives in generated code.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Operand {
    Literal(Value),
    Symbol(String),
    Temp(Temp),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Literal(Value::Int(num)) => write!(f, "{num}"),
            Operand::Literal(Value::Str(text)) => {
                write!(f, "\"{}\"", escape(text))
            }
            Operand::Symbol(name) => write!(f, "{name}"),
            Operand::Temp(temp) => write!(f, "{temp}"),
        }
    }
}

/// Keeps a string literal on one line of TAC text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unescape(text: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => unescaped.push('\\'),
            'n' => unescaped.push('\n'),
            'r' => unescaped.push('\r'),
            _ => return None,
        }
    }
    Some(unescaped)
}

/// Destination of an assignment.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Place {
    Symbol(String),
    Temp(Temp),
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Place::Symbol(name) => write!(f, "{name}"),
            Place::Temp(temp) => write!(f, "{temp}"),
        }
    }
}

impl From<Place> for Operand {
    fn from(value: Place) -> Self {
        match value {
            Place::Symbol(name) => Operand::Symbol(name),
            Place::Temp(temp) => Operand::Temp(temp),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Greater,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Greater => write!(f, ">"),
        }
    }
}

impl FromStr for BinaryOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(BinaryOp::Add),
            "-" => Ok(BinaryOp::Sub),
            "*" => Ok(BinaryOp::Mul),
            "/" => Ok(BinaryOp::Div),
            ">" => Ok(BinaryOp::Greater),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    Assign {
        dest: Place,
        value: Operand,
    },
    Binary {
        dest: Place,
        left: Operand,
        op: BinaryOp,
        right: Operand,
    },
    Label(Label),
    Goto(Label),
    CondGoto {
        condition: Operand,
        target: Label,
    },
    Return(Operand),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Assign { dest, value } => write!(f, "{dest} = {value}"),
            Instruction::Binary {
                dest,
                left,
                op,
                right,
            } => write!(f, "{dest} = {left} {op} {right}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Goto(label) => write!(f, "goto {label}"),
            Instruction::CondGoto { condition, target } => {
                write!(f, "if {condition} goto {target}")
            }
            Instruction::Return(value) => write!(f, "return {value}"),
        }
    }
}

/// Splits on single spaces, keeping a double-quoted literal as one word.
fn split_words(line: &str) -> Option<Vec<&str>> {
    let mut words = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        let end = if let Some(body) = rest.strip_prefix('"') {
            body.find('"')? + 2
        } else {
            rest.find(' ').unwrap_or(rest.len())
        };
        words.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some(words)
}

fn parse_numbered(word: &str, prefix: char) -> Option<u32> {
    let digits = word.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_label(word: &str) -> Option<Label> {
    parse_numbered(word, 'L').map(Label)
}

fn parse_place(word: &str) -> Option<Place> {
    if let Some(index) = parse_numbered(word, 't') {
        Some(Place::Temp(Temp(index)))
    } else if word.starts_with(|c: char| c.is_ascii_alphabetic())
        && word.chars().all(|c| c.is_ascii_alphanumeric())
    {
        Some(Place::Symbol(word.into()))
    } else {
        None
    }
}

fn parse_operand(word: &str) -> Option<Operand> {
    if let Some(text) = word
        .strip_prefix('"')
        .and_then(|body| body.strip_suffix('"'))
    {
        return unescape(text).map(|text| Operand::Literal(Value::Str(text)));
    }
    if let Ok(num) = word.parse::<i64>() {
        return Some(Operand::Literal(Value::Int(num)));
    }
    parse_place(word).map(Operand::from)
}

impl FromStr for Instruction {
    type Err = TacParseError;

    /// Parses one canonical line with exact arity per instruction shape.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || TacParseError::Malformed(line.into());
        let words = split_words(line).ok_or_else(malformed)?;
        let instruction = match words.as_slice() {
            [label] => label
                .strip_suffix(':')
                .and_then(parse_label)
                .map(Instruction::Label),
            ["goto", label] => parse_label(label).map(Instruction::Goto),
            ["return", value] => parse_operand(value).map(Instruction::Return),
            [dest, "=", value] => parse_place(dest)
                .zip(parse_operand(value))
                .map(|(dest, value)| Instruction::Assign { dest, value }),
            ["if", condition, "goto", target] => parse_operand(condition)
                .zip(parse_label(target))
                .map(|(condition, target)| Instruction::CondGoto {
                    condition,
                    target,
                }),
            [dest, "=", left, op, right] => {
                let op = op.parse::<BinaryOp>().map_err(|_| {
                    TacParseError::UnknownOperator {
                        operator: op.to_string(),
                        line: line.into(),
                    }
                })?;
                match (parse_place(dest), parse_operand(left), parse_operand(right)) {
                    (Some(dest), Some(left), Some(right)) => {
                        Some(Instruction::Binary {
                            dest,
                            left,
                            op,
                            right,
                        })
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        instruction.ok_or_else(malformed)
    }
}

/// Canonical text: one instruction per line, no indentation.
pub fn render(instructions: &[Instruction]) -> String {
    let mut text = String::new();
    for instruction in instructions {
        text.push_str(&instruction.to_string());
        text.push('\n');
    }
    text
}

/// Display-only rendering that indents everything between a label and the
/// next unconditional `goto` by four spaces.
pub fn render_pretty(instructions: &[Instruction]) -> String {
    let mut text = String::new();
    let mut in_block = false;
    for instruction in instructions {
        match instruction {
            Instruction::Label(_) => {
                in_block = true;
            }
            Instruction::Goto(_) => {
                in_block = false;
            }
            _ if in_block => text.push_str("    "),
            _ => {}
        }
        text.push_str(&instruction.to_string());
        text.push('\n');
    }
    text
}

/// Parses canonical (or pretty) TAC text, skipping blank lines.
pub fn parse(text: &str) -> Result<Vec<Instruction>, TacParseError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::parse)
        .collect()
}
