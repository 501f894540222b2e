//! The command model a parsed assembly source is made of: labels,
//! instructions and the higher-level directives the assembler lowers into
//! them.
//!
//! Grounded in `original_source/ic4/assembly/commands.py`. `check()` mirrors
//! the Python `Command.check`/`Param.check` methods: it's an advisory
//! structural-validity pass the assembler itself never calls, offered for
//! a front-end (parser or hand-written test) that wants to validate a
//! command before handing it to [`crate::assembler::assemble`].

use std::collections::HashMap;

use intcode_vm::OpCode;
pub use intcode_vm::Mode;

use crate::expr::{Expression, Reference, SimplifyFailure};

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum CheckError {
    #[error("expected {expected} parameters for {opcode}, got {got}")]
    WrongArity { opcode: OpCode, expected: usize, got: usize },
    #[error("parameter {0} must be writable but is in immediate mode")]
    NotWritable(usize),
    #[error("absolute parameter cannot have a negative value ({0})")]
    NegativeAbsolute(i64),
    #[error("size parameter cannot be negative ({0})")]
    NegativeSize(i64),
}

/// An instruction parameter: an addressing mode plus the expression whose
/// value (at assembly time) or address (at run time, for non-immediate
/// modes) it denotes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Parameter {
    pub mode: Mode,
    pub value: Expression,
}

impl Parameter {
    pub fn new(mode: Mode, value: Expression) -> Parameter {
        Parameter { mode, value }
    }

    pub fn absolute(value: Expression) -> Parameter {
        Parameter::new(Mode::Absolute, value)
    }

    pub fn immediate(value: Expression) -> Parameter {
        Parameter::new(Mode::Immediate, value)
    }

    pub fn relative(value: Expression) -> Parameter {
        Parameter::new(Mode::Relative, value)
    }

    pub fn can_be_written(&self) -> bool {
        self.mode.is_writable()
    }

    /// Checks that an `Absolute` parameter which is already foldable to a
    /// constant doesn't carry a negative value. Non-foldable values are not
    /// an error here — they may well resolve positively once labels are
    /// known.
    pub fn check(&self) -> Result<(), CheckError> {
        if self.mode != Mode::Absolute {
            return Ok(());
        }
        if let Ok(simplified) = self.value.simplify(&HashMap::new(), true) {
            if let Some(value) = simplified.as_constant() {
                if value < 0 {
                    return Err(CheckError::NegativeAbsolute(value));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode: OpCode,
    pub params: Vec<Parameter>,
}

impl Instruction {
    pub fn new(opcode: OpCode, params: Vec<Parameter>) -> Instruction {
        Instruction { opcode, params }
    }

    pub fn check(&self) -> Result<(), CheckError> {
        let expected = self.opcode.arity();
        if self.params.len() != expected {
            return Err(CheckError::WrongArity {
                opcode: self.opcode,
                expected,
                got: self.params.len(),
            });
        }
        for (i, p) in self.params.iter().enumerate() {
            if self.opcode.writes_to(i) && !p.can_be_written() {
                return Err(CheckError::NotWritable(i));
            }
            p.check()?;
        }
        Ok(())
    }
}

/// A higher-level pseudo-instruction the assembler lowers into one or more
/// primitive [`Instruction`]s. `PUSH`'s `value` and `POP`'s `dest` are full
/// `Parameter`s, matching the grammar's `PUSH (param)? (, size)?` shape.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    /// Verbatim integer constants.
    Ints(Vec<Expression>),
    /// A raw (not yet escape-decoded) string body, e.g. from a `"..."`
    /// literal in source; lowered the same as `Ints` once decoded.
    IntsString(String),
    Zeros(Expression),
    Inc(Parameter),
    Dec(Parameter),
    Mov { src: Parameter, dest: Parameter, size: Expression },
    Load { src_ptr: Parameter, dest: Parameter },
    Store { src: Parameter, dest_ptr: Parameter },
    Jmp(Parameter),
    Push { value: Option<Parameter>, size: Expression },
    Pop { dest: Option<Parameter>, size: Expression },
    Call(Parameter),
    Ret,
}

impl Directive {
    pub fn mov(src: Parameter, dest: Parameter) -> Directive {
        Directive::Mov { src, dest, size: Expression::Constant(1) }
    }

    pub fn push(value: Option<Parameter>) -> Directive {
        Directive::Push { value, size: Expression::Constant(1) }
    }

    pub fn pop(dest: Option<Parameter>) -> Directive {
        Directive::Pop { dest, size: Expression::Constant(1) }
    }

    fn check_size(size: &Expression) -> Result<(), CheckError> {
        if let Ok(simplified) = size.simplify(&HashMap::new(), true) {
            if let Some(value) = simplified.as_constant() {
                if value < 0 {
                    return Err(CheckError::NegativeSize(value));
                }
            }
        }
        Ok(())
    }

    pub fn check(&self) -> Result<(), CheckError> {
        match self {
            Directive::Ints(_) | Directive::IntsString(_) | Directive::Ret => Ok(()),
            Directive::Zeros(len) => Directive::check_size(len),
            Directive::Inc(p) | Directive::Dec(p) => {
                p.check()?;
                if !p.can_be_written() {
                    return Err(CheckError::NotWritable(0));
                }
                Ok(())
            }
            Directive::Mov { src, dest, size } => {
                src.check()?;
                dest.check()?;
                if !dest.can_be_written() {
                    return Err(CheckError::NotWritable(1));
                }
                Directive::check_size(size)
            }
            Directive::Load { src_ptr, dest } => {
                src_ptr.check()?;
                dest.check()?;
                if !dest.can_be_written() {
                    return Err(CheckError::NotWritable(1));
                }
                Ok(())
            }
            Directive::Store { src, dest_ptr } => {
                src.check()?;
                dest_ptr.check()
            }
            Directive::Jmp(p) | Directive::Call(p) => p.check(),
            Directive::Push { value, size } => {
                if let Some(p) = value {
                    p.check()?;
                }
                Directive::check_size(size)
            }
            Directive::Pop { dest, size } => {
                if let Some(p) = dest {
                    p.check()?;
                    if !p.can_be_written() {
                        return Err(CheckError::NotWritable(0));
                    }
                }
                Directive::check_size(size)
            }
        }
    }
}

/// One line of assembly source: a label definition, a primitive
/// instruction, or a directive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Label(String),
    Instruction(Instruction),
    Directive(Directive),
}

impl Command {
    pub fn check(&self) -> Result<(), CheckError> {
        match self {
            Command::Label(_) => Ok(()),
            Command::Instruction(i) => i.check(),
            Command::Directive(d) => d.check(),
        }
    }
}

/// Builds the label reference used for a given label name — the glue
/// between `Command::Label` definitions and `Parameter`/`Expression`
/// references to them.
pub fn label_reference(name: impl Into<String>) -> Expression {
    Expression::Reference(Reference::new(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_arity_is_rejected() {
        let instr = Instruction::new(OpCode::Add, vec![Parameter::absolute(Expression::Constant(0))]);
        assert_eq!(
            instr.check(),
            Err(CheckError::WrongArity { opcode: OpCode::Add, expected: 3, got: 1 })
        );
    }

    #[test]
    fn write_target_in_immediate_mode_is_rejected() {
        let instr = Instruction::new(
            OpCode::Add,
            vec![
                Parameter::absolute(Expression::Constant(1)),
                Parameter::absolute(Expression::Constant(2)),
                Parameter::immediate(Expression::Constant(3)),
            ],
        );
        assert_eq!(instr.check(), Err(CheckError::NotWritable(2)));
    }

    #[test]
    fn negative_absolute_constant_is_rejected() {
        let p = Parameter::absolute(Expression::Constant(-1));
        assert_eq!(p.check(), Err(CheckError::NegativeAbsolute(-1)));
    }

    #[test]
    fn negative_absolute_is_not_flagged_when_unresolved() {
        let p = Parameter::absolute(label_reference("later"));
        assert!(p.check().is_ok());
    }

    #[test]
    fn inc_requires_a_writable_destination() {
        let d = Directive::Inc(Parameter::immediate(Expression::Constant(0)));
        assert_eq!(d.check(), Err(CheckError::NotWritable(0)));
    }
}
