//! Lowers canonical TAC text into pseudo-x86 lines. Works purely on the
//! text format so it can consume output persisted by an earlier run.

use crate::error::TacParseError;
use crate::tac::{self, BinaryOp, Instruction, Operand, Place, Temp};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Register(u32);

/// Holds the value of a `return`.
pub const RETURN_REGISTER: Register = Register(0);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

struct Registers {
    count: u32,
}

impl Registers {
    fn new() -> Self {
        Self { count: 1 }
    }

    fn allocate(&mut self) -> Register {
        let register = Register(self.count);
        self.count += 1;
        register
    }
}

pub struct AssemblyGenerator {
    registers: Registers,
    temps: HashMap<Temp, Register>,
    code: Vec<String>,
}

impl Default for AssemblyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyGenerator {
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            temps: HashMap::new(),
            code: Vec::new(),
        }
    }

    pub fn generate(mut self, instructions: &[Instruction]) -> Vec<String> {
        for instruction in instructions {
            self.instruction(instruction);
        }
        self.code
    }

    fn emit(&mut self, line: String) {
        trace!(%line, "asm");
        self.code.push(line);
    }

    fn operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Temp(temp) => match self.temps.get(temp) {
                Some(register) => register.to_string(),
                None => temp.to_string(),
            },
            _ => operand.to_string(),
        }
    }

    fn store(&mut self, dest: &Place, register: Register) {
        match dest {
            Place::Temp(temp) => {
                self.temps.insert(*temp, register);
            }
            Place::Symbol(name) => self.emit(format!("MOV {name}, {register}")),
        }
    }

    fn instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Assign { dest, value } => {
                let register = self.registers.allocate();
                let value = self.operand(value);
                self.emit(format!("MOV {register}, {value}"));
                self.store(dest, register);
            }
            Instruction::Binary {
                dest,
                left,
                op,
                right,
            } => {
                let register = self.registers.allocate();
                let left = self.operand(left);
                let right = self.operand(right);
                self.emit(format!("MOV {register}, {left}"));
                match op {
                    BinaryOp::Greater => {
                        self.emit(format!("CMP {register}, {right}"));
                        self.emit(format!("SETG {register}"));
                    }
                    _ => {
                        let mnemonic = match op {
                            BinaryOp::Add => "ADD",
                            BinaryOp::Sub => "SUB",
                            BinaryOp::Mul => "MUL",
                            _ => "DIV",
                        };
                        self.emit(format!("{mnemonic} {register}, {right}"));
                    }
                }
                self.store(dest, register);
            }
            Instruction::Label(label) => self.emit(format!("{label}:")),
            Instruction::Goto(label) => self.emit(format!("JMP {label}")),
            Instruction::CondGoto { condition, target } => {
                let condition = self.operand(condition);
                self.emit(format!("CMP {condition}, 1"));
                self.emit(format!("JE {target}"));
            }
            Instruction::Return(value) => {
                let value = self.operand(value);
                self.emit(format!("MOV {RETURN_REGISTER}, {value}"));
                self.emit("RET".into());
            }
        }
    }
}

/// Parses `text` as canonical TAC and lowers it.
pub fn generate(text: &str) -> Result<Vec<String>, TacParseError> {
    let instructions = tac::parse(text)?;
    Ok(AssemblyGenerator::new().generate(&instructions))
}
