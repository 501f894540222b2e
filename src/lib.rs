extern crate num;
#[macro_use]
extern crate num_derive;

pub mod memory;
pub mod opcode;
pub mod processor;

/// A single IntCode memory cell / parameter value.
pub type Word = i64;

pub use memory::{AddressError, Memory};
pub use opcode::{Mode, OpCode};
pub use processor::{Fault, Processor, RunOutcome};
