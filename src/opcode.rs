use std::fmt;

use num::{FromPrimitive, ToPrimitive};
use num_derive::{FromPrimitive, ToPrimitive};

use crate::Word;

/// Addressing mode for a single instruction parameter.
///
/// Shared between the interpreter (which decodes it from the op word) and
/// the assembler crate (which builds `Parameter`s carrying one of these).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Absolute = 0,
    Immediate = 1,
    Relative = 2,
}

impl Mode {
    pub fn from_digit(digit: Word) -> Option<Mode> {
        match digit {
            0 => Some(Mode::Absolute),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }

    pub fn digit(self) -> Word {
        self as Word
    }

    pub fn is_writable(self) -> bool {
        self != Mode::Immediate
    }
}

// Opcode | value | arity | writes-to mask
//--------+-------+-------+-------------------------------
// ADD    |   1   |   3   | (_, _, W)
// MUL    |   2   |   3   | (_, _, W)
// IN     |   3   |   1   | (W,)
// OUT    |   4   |   1   | (_,)
// JNZ    |   5   |   2   | (_, _)
// JZ     |   6   |   2   | (_, _)
// SLT    |   7   |   3   | (_, _, W)   set-if-less-than
// SEQ    |   8   |   3   | (_, _, W)   set-if-equal
// INCB   |   9   |   1   | (_,)        increment relative base
// HALT   |  99   |   0   | ()

/// One of the nine IntCode opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum OpCode {
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Slt = 7,
    Seq = 8,
    IncB = 9,
    Halt = 99,
}

impl OpCode {
    pub fn value(self) -> Word {
        self.to_i64().expect("OpCode always fits in i64")
    }

    pub fn from_value(value: Word) -> Option<OpCode> {
        OpCode::from_i64(value)
    }

    pub const fn arity(self) -> usize {
        match self {
            OpCode::Add | OpCode::Mul | OpCode::Slt | OpCode::Seq => 3,
            OpCode::Jnz | OpCode::Jz => 2,
            OpCode::In | OpCode::Out | OpCode::IncB => 1,
            OpCode::Halt => 0,
        }
    }

    /// Whether the parameter at `position` (0-indexed) is a write target.
    pub fn writes_to(self, position: usize) -> bool {
        matches!(
            (self, position),
            (OpCode::Add | OpCode::Mul | OpCode::Slt | OpCode::Seq, 2) | (OpCode::In, 0)
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCode::Add => "ADD",
            OpCode::Mul => "MUL",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::Jnz => "JNZ",
            OpCode::Jz => "JZ",
            OpCode::Slt => "SLT",
            OpCode::Seq => "SEQ",
            OpCode::IncB => "INCB",
            OpCode::Halt => "HALT",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrips_through_from_value() {
        for op in [
            OpCode::Add,
            OpCode::Mul,
            OpCode::In,
            OpCode::Out,
            OpCode::Jnz,
            OpCode::Jz,
            OpCode::Slt,
            OpCode::Seq,
            OpCode::IncB,
            OpCode::Halt,
        ] {
            assert_eq!(OpCode::from_value(op.value()), Some(op));
        }
    }

    #[test]
    fn unknown_value_is_none() {
        assert_eq!(OpCode::from_value(0), None);
        assert_eq!(OpCode::from_value(10), None);
    }

    #[test]
    fn writes_to_matches_arity_table() {
        assert!(OpCode::Add.writes_to(2));
        assert!(!OpCode::Add.writes_to(0));
        assert!(!OpCode::Add.writes_to(1));
        assert!(OpCode::In.writes_to(0));
        assert!(!OpCode::Out.writes_to(0));
        assert!(!OpCode::Halt.writes_to(0));
    }

    #[test]
    fn mode_digit_roundtrip() {
        for mode in [Mode::Absolute, Mode::Immediate, Mode::Relative] {
            assert_eq!(Mode::from_digit(mode.digit()), Some(mode));
        }
        assert_eq!(Mode::from_digit(3), None);
    }
}
