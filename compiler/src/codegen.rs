use crate::tac::{Instruction, Label, Temp};
use tracing::trace;

struct Temps {
    count: u32,
}

impl Temps {
    fn new() -> Self {
        Self { count: 0 }
    }

    fn create(&mut self) -> Temp {
        let temp = Temp(self.count);
        self.count += 1;
        temp
    }
}

struct Labels {
    count: u32,
}

impl Labels {
    fn new() -> Self {
        Self { count: 1 }
    }

    fn create(&mut self) -> Label {
        let label = Label(self.count);
        self.count += 1;
        label
    }
}

/// Append-only instruction stream plus the temporary and label counters of
/// one compilation.
pub struct CodeGen {
    temps: Temps,
    labels: Labels,
    instructions: Vec<Instruction>,
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen {
    pub fn new() -> Self {
        Self {
            temps: Temps::new(),
            labels: Labels::new(),
            instructions: Vec::new(),
        }
    }

    pub fn new_temp(&mut self) -> Temp {
        let temp = self.temps.create();
        trace!(%temp, "allocate temporary");
        temp
    }

    pub fn new_label(&mut self) -> Label {
        let label = self.labels.create();
        trace!(%label, "allocate label");
        label
    }

    pub fn emit(&mut self, instruction: Instruction) {
        trace!(%instruction, "emit");
        self.instructions.push(instruction);
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.instructions
    }
}
