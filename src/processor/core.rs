use std::collections::VecDeque;

use crate::memory::Memory;
use crate::opcode::{Mode, OpCode};
use crate::Word;

use super::Fault;

/// Outcome of a single `tick()` call.
pub enum TickResult {
    /// The instruction executed normally; keep ticking.
    Running,
    /// An `IN` instruction found the input queue empty. `pc` was left
    /// pointing at the `IN` instruction itself, so the next `tick()` (once
    /// input has been supplied) re-executes it from scratch.
    Suspended,
    /// `HALT` executed.
    Halted,
}

/// The interpreter's mutable state: memory, program counter, relative base,
/// and the input/output FIFOs that stand in for IntCode's "tape" I/O.
pub struct Core {
    mem: Memory,
    pc: i64,
    rb: i64,
    halted: bool,
    input: VecDeque<i64>,
    output: VecDeque<i64>,
}

impl Core {
    pub fn new() -> Core {
        Core {
            mem: Memory::new(),
            pc: 0,
            rb: 0,
            halted: false,
            input: VecDeque::new(),
            output: VecDeque::new(),
        }
    }

    pub fn load_program(&mut self, program: &[Word]) {
        self.mem = Memory::from_program(program);
        self.pc = 0;
        self.rb = 0;
        self.halted = false;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn give_input(&mut self, value: Word) {
        self.input.push_back(value);
    }

    pub fn take_output(&mut self) -> Option<Word> {
        self.output.pop_front()
    }

    pub fn mem(&self) -> &Memory {
        &self.mem
    }

    /// Resolves parameter `position` (0-indexed) of the instruction at `pc`
    /// for reading: returns the effective value, following `mode`.
    fn read_param(&self, position: usize, mode: Mode) -> Result<Word, Fault> {
        let raw = self.mem.read(self.pc + 1 + position as i64).map_err(|_| {
            Fault::NegativeAddress {
                pc: self.pc,
                address: self.pc + 1 + position as i64,
            }
        })?;
        match mode {
            Mode::Immediate => Ok(raw),
            Mode::Absolute => self.mem.read(raw).map_err(|_| Fault::NegativeAddress {
                pc: self.pc,
                address: raw,
            }),
            Mode::Relative => {
                let addr = self.rb + raw;
                self.mem
                    .read(addr)
                    .map_err(|_| Fault::NegativeAddress { pc: self.pc, address: addr })
            }
        }
    }

    /// Resolves parameter `position` for writing: returns the absolute
    /// address the write should land at.
    fn write_addr(&self, position: usize, mode: Mode) -> Result<Word, Fault> {
        let raw = self.mem.read(self.pc + 1 + position as i64).map_err(|_| {
            Fault::NegativeAddress {
                pc: self.pc,
                address: self.pc + 1 + position as i64,
            }
        })?;
        match mode {
            Mode::Immediate => Err(Fault::ImmediateWrite { pc: self.pc }),
            Mode::Absolute => Ok(raw),
            Mode::Relative => Ok(self.rb + raw),
        }
    }

    fn write(&mut self, address: Word, value: Word) -> Result<(), Fault> {
        self.mem
            .write(address, value)
            .map_err(|_| Fault::NegativeAddress { pc: self.pc, address })
    }

    fn decode_modes(&self, op: Word) -> Result<(OpCode, [Mode; 3]), Fault> {
        let opcode_value = op % 100;
        let opcode = OpCode::from_value(opcode_value).ok_or(Fault::InvalidOpcode {
            pc: self.pc,
            opcode: opcode_value,
        })?;

        let mut modes = [Mode::Absolute; 3];
        let mut rest = op / 100;
        for slot in modes.iter_mut() {
            let digit = rest % 10;
            *slot = Mode::from_digit(digit).ok_or(Fault::InvalidMode { pc: self.pc, digit })?;
            rest /= 10;
        }
        Ok((opcode, modes))
    }

    pub fn tick(&mut self) -> Result<TickResult, Fault> {
        if self.halted {
            return Ok(TickResult::Halted);
        }

        let op = self
            .mem
            .read(self.pc)
            .map_err(|_| Fault::NegativeAddress { pc: self.pc, address: self.pc })?;
        let (opcode, modes) = self.decode_modes(op)?;

        tracing::trace!(pc = self.pc, opcode = %opcode, "tick");

        match opcode {
            OpCode::Add => {
                let a = self.read_param(0, modes[0])?;
                let b = self.read_param(1, modes[1])?;
                let dest = self.write_addr(2, modes[2])?;
                self.write(dest, a + b)?;
                self.pc += 4;
            }
            OpCode::Mul => {
                let a = self.read_param(0, modes[0])?;
                let b = self.read_param(1, modes[1])?;
                let dest = self.write_addr(2, modes[2])?;
                self.write(dest, a * b)?;
                self.pc += 4;
            }
            OpCode::In => {
                let value = match self.input.pop_front() {
                    Some(v) => v,
                    None => return Ok(TickResult::Suspended),
                };
                let dest = self.write_addr(0, modes[0])?;
                self.write(dest, value)?;
                self.pc += 2;
            }
            OpCode::Out => {
                let value = self.read_param(0, modes[0])?;
                self.output.push_back(value);
                self.pc += 2;
            }
            OpCode::Jnz => {
                let cond = self.read_param(0, modes[0])?;
                let target = self.read_param(1, modes[1])?;
                self.pc = if cond != 0 { target } else { self.pc + 3 };
            }
            OpCode::Jz => {
                let cond = self.read_param(0, modes[0])?;
                let target = self.read_param(1, modes[1])?;
                self.pc = if cond == 0 { target } else { self.pc + 3 };
            }
            OpCode::Slt => {
                let a = self.read_param(0, modes[0])?;
                let b = self.read_param(1, modes[1])?;
                let dest = self.write_addr(2, modes[2])?;
                self.write(dest, if a < b { 1 } else { 0 })?;
                self.pc += 4;
            }
            OpCode::Seq => {
                let a = self.read_param(0, modes[0])?;
                let b = self.read_param(1, modes[1])?;
                let dest = self.write_addr(2, modes[2])?;
                self.write(dest, if a == b { 1 } else { 0 })?;
                self.pc += 4;
            }
            OpCode::IncB => {
                let delta = self.read_param(0, modes[0])?;
                self.rb += delta;
                self.pc += 2;
            }
            OpCode::Halt => {
                self.halted = true;
                return Ok(TickResult::Halted);
            }
        }

        Ok(TickResult::Running)
    }
}

impl Default for Core {
    fn default() -> Core {
        Core::new()
    }
}
