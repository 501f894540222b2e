mod core;

use self::core::{Core, TickResult};
use crate::memory::Memory;
use crate::Word;

/// A fatal, non-resumable interpreter error.
///
/// Distinct from [`RunOutcome::Suspended`]: a fault means the program's
/// semantics are undefined from here on (bad address, bad opcode, writing
/// through an immediate parameter), whereas suspension is normal and
/// recoverable by supplying more input and calling `run` again.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum Fault {
    #[error("negative address {address} (pc={pc})")]
    NegativeAddress { pc: Word, address: Word },

    #[error("attempted to write through an immediate parameter (pc={pc})")]
    ImmediateWrite { pc: Word },

    #[error("invalid addressing mode digit {digit} (pc={pc})")]
    InvalidMode { pc: Word, digit: Word },

    #[error("invalid opcode {opcode} (pc={pc})")]
    InvalidOpcode { pc: Word, opcode: Word },
}

/// Result of a successful (non-faulting) `run()`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunOutcome {
    /// The program executed `HALT`.
    Halted,
    /// Execution stopped because an `IN` instruction found no buffered
    /// input. Call [`Processor::give_input`] and `run` again to resume.
    Suspended,
}

/// The IntCode interpreter.
///
/// `run` is re-entrant: it may be called repeatedly across `IN`
/// suspensions, and is idempotent once the program has halted.
pub struct Processor {
    core: Core,
}

impl Processor {
    pub fn new() -> Processor {
        Processor { core: Core::new() }
    }

    /// Loads `program` into memory at address 0, resetting all other state.
    pub fn load_program(&mut self, program: &[Word]) {
        self.core.load_program(program);
    }

    /// Appends a single value to the input FIFO. Never blocks.
    pub fn give_input(&mut self, value: Word) {
        self.core.give_input(value);
    }

    /// Appends every value of `values` to the input FIFO, in order.
    pub fn give_input_iter<I: IntoIterator<Item = Word>>(&mut self, values: I) {
        for value in values {
            self.core.give_input(value);
        }
    }

    pub fn halted(&self) -> bool {
        self.core.halted()
    }

    /// A read-only view of the VM's memory, e.g. for tests that inspect the
    /// effect of self-modifying code (the LOAD/STORE patch slot) or watch a
    /// destination cell after a run.
    pub fn mem(&self) -> &Memory {
        self.core.mem()
    }

    /// Runs until the program halts, suspends on an empty `IN`, or faults.
    ///
    /// Once halted, further calls are no-ops that return `Ok(Halted)`
    /// without touching any state.
    pub fn run(&mut self) -> Result<RunOutcome, Fault> {
        loop {
            match self.core.tick()? {
                TickResult::Running => continue,
                TickResult::Suspended => return Ok(RunOutcome::Suspended),
                TickResult::Halted => return Ok(RunOutcome::Halted),
            }
        }
    }

    /// Returns the next buffered output value, running the program first if
    /// none is currently available. `Ok(None)` means the program produced
    /// no further output before halting or suspending.
    pub fn get_output(&mut self) -> Result<Option<Word>, Fault> {
        if let Some(value) = self.core.take_output() {
            return Ok(Some(value));
        }
        self.run()?;
        Ok(self.core.take_output())
    }
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day2_style_program_halts_with_expected_memory() {
        let mut proc = Processor::new();
        proc.load_program(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        assert_eq!(proc.run(), Ok(RunOutcome::Halted));
    }

    #[test]
    fn echo_program_suspends_on_empty_input_then_resumes() {
        // 3,0,4,0,99: IN into addr 0, OUT addr 0, HALT.
        let mut proc = Processor::new();
        proc.load_program(&[3, 0, 4, 0, 99]);
        assert_eq!(proc.run(), Ok(RunOutcome::Suspended));
        proc.give_input(7);
        assert_eq!(proc.run(), Ok(RunOutcome::Halted));
        assert_eq!(proc.get_output(), Ok(Some(7)));
    }

    #[test]
    fn halt_is_idempotent() {
        let mut proc = Processor::new();
        proc.load_program(&[99]);
        assert_eq!(proc.run(), Ok(RunOutcome::Halted));
        assert_eq!(proc.run(), Ok(RunOutcome::Halted));
        assert!(proc.halted());
    }

    #[test]
    fn immediate_write_faults() {
        // ADD with its destination parameter (the third, ten-thousands
        // digit) in immediate mode: 10001 = opcode 1, m3 = 1.
        let mut proc = Processor::new();
        proc.load_program(&[10001, 5, 5, 0, 99]);
        assert_eq!(proc.run(), Err(Fault::ImmediateWrite { pc: 0 }));
    }

    #[test]
    fn negative_address_faults() {
        let mut proc = Processor::new();
        proc.load_program(&[1, -1, 0, 0, 99]);
        assert_eq!(
            proc.run(),
            Err(Fault::NegativeAddress { pc: 0, address: -1 })
        );
    }

    #[test]
    fn relative_base_addressing_round_trips() {
        // 109,19,204,-6,99: INCB #19 sets rb=19, OUT rb-6=13... simpler: use
        // a small quine-unrelated relative read/write check instead.
        let mut proc = Processor::new();
        // 109,5 -> rb += 5 (rb=5); 21108,1,1,6 -> SEQ immediate 1==1 -> write
        // via relative mode at rb+? Keep this straightforward: write through
        // relative mode, then read it back via absolute mode.
        proc.load_program(&[109, 5, 21101, 42, 0, 0, 204, 0, 99]);
        assert_eq!(proc.run(), Ok(RunOutcome::Halted));
        assert_eq!(proc.get_output(), Ok(Some(42)));
    }
}
