//! Lowers a [`SourceFile`] into the flat integer sequence the IntCode VM
//! executes.
//!
//! Grounded in `original_source/ic4/assembler/assembler.py`. The algorithm is
//! a work-stack expansion rather than host-stack recursion (see
//! `SPEC_FULL.md` §4.D / §9): commands are popped one at a time from a
//! `Vec` acting as a stack, and directives that lower into other commands
//! push their replacement back on top, in reverse, so the next pop visits
//! the first replacement. This keeps the emission order identical to the
//! source body regardless of how deep a single directive's lowering nests.
//!
//! A directive forms its replacement commands eagerly and in full before
//! pushing them, so a `LOAD`/`STORE`/`CALL` nested inside another such
//! directive re-enters `lower_directive` rather than looping here.

use std::collections::HashMap;

use intcode_vm::{Mode, OpCode};

use crate::command::{Command, Directive, Instruction, Parameter};
use crate::escape::{self, EscapeError};
use crate::expr::{Expression, Reference, SimplifyFailure};
use crate::source_file::{Header, SourceFile};
use crate::version::Version;

/// Every way [`assemble`] can fail. All are fatal: the assembler abandons
/// emission at the first one encountered.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("source declares an OBJECTS header; linking is not implemented")]
    UnsupportedFormat,
    #[error("unsupported source version {0}; only 0.1 is accepted")]
    UnsupportedVersion(Version),
    #[error("invalid escape sequence in INTS string literal: {0}")]
    InvalidEscape(#[from] EscapeError),
    #[error("ZEROS length did not fold to a constant: {0}")]
    ZerosNotFoldable(#[source] SimplifyFailure),
    #[error("ZEROS length must be non-negative, got {0}")]
    ZerosNegative(i64),
    #[error("MOV size did not fold to a constant: {0}")]
    MovSizeNotFoldable(#[source] SimplifyFailure),
    #[error("MOV size must be non-negative, got {0}")]
    MovSizeNegative(i64),
    #[error("unresolved reference in emitted program: {0}")]
    UnresolvedReference(#[source] SimplifyFailure),
}

fn required_version() -> Version {
    Version::new(0, 1, 0)
}

/// Generates fresh internal label names `&0`, `&1`, ... Guaranteed not to
/// collide with user-written names, since `&` is reserved (`SPEC_FULL.md`
/// §3).
struct NameGen(u64);

impl NameGen {
    fn fresh(&mut self) -> String {
        let name = format!("&{}", self.0);
        self.0 += 1;
        name
    }
}

/// Pushes `commands` onto `stack` so that popping them back off yields them
/// in the same order they're given here.
fn push_in_order(stack: &mut Vec<Command>, commands: Vec<Command>) {
    for command in commands.into_iter().rev() {
        stack.push(command);
    }
}

/// Lowers `SourceFile { Executable 0.1, body }` into the emitted integer
/// sequence the VM executes.
pub fn assemble(source: &SourceFile) -> Result<Vec<i64>, AssembleError> {
    match &source.header {
        Header::Objects { .. } => return Err(AssembleError::UnsupportedFormat),
        Header::Executable { version } => {
            if *version != required_version() {
                return Err(AssembleError::UnsupportedVersion(version.clone()));
            }
        }
    }

    let mut code: Vec<Expression> = Vec::new();
    let mut labels: HashMap<Reference, Expression> = HashMap::new();
    let mut stack: Vec<Command> = Vec::new();
    let mut names = NameGen(0);

    push_in_order(&mut stack, source.body.clone());

    while let Some(command) = stack.pop() {
        match command {
            Command::Label(name) => bind_label(&mut labels, &code, name),
            Command::Instruction(instr) => emit_instruction(&mut code, &instr),
            Command::Directive(directive) => {
                lower_directive(directive, &mut code, &labels, &mut stack, &mut names)?
            }
        }
    }

    resolve(&code, &labels)
}

fn bind_label(labels: &mut HashMap<Reference, Expression>, code: &[Expression], name: String) {
    let reference = Reference::new(name.clone());
    let value = Expression::Constant(code.len() as i64);
    if labels.contains_key(&reference) {
        tracing::warn!(label = %name, "label redefined; last binding wins");
    }
    labels.insert(reference, value);
}

/// The combined opcode word: `opcode + sum_i 100 * 10^i * mode_i`, where
/// mode digits correspond left-to-right to parameters `1..N`.
fn op_word(opcode: OpCode, params: &[Parameter]) -> i64 {
    let mode_digits: i64 = params
        .iter()
        .enumerate()
        .map(|(i, p)| 100 * 10i64.pow(i as u32) * p.mode.digit())
        .sum();
    opcode.value() + mode_digits
}

fn emit_instruction(code: &mut Vec<Expression>, instr: &Instruction) {
    code.push(Expression::Constant(op_word(instr.opcode, &instr.params)));
    code.extend(instr.params.iter().map(|p| p.value.clone()));
}

fn add(opcode: OpCode, params: Vec<Parameter>) -> Command {
    Command::Instruction(Instruction::new(opcode, params))
}

fn directive(d: Directive) -> Command {
    Command::Directive(d)
}

/// Folds `expr` fully against `labels`, requiring a non-negative constant.
/// `not_foldable`/`negative` build the two distinct error variants a caller
/// cares about (`ZEROS`' vs. `MOV`'s size, per `SPEC_FULL.md` §4.D).
fn fold_nonnegative(
    expr: &Expression,
    labels: &HashMap<Reference, Expression>,
    not_foldable: impl FnOnce(SimplifyFailure) -> AssembleError,
    negative: impl FnOnce(i64) -> AssembleError,
) -> Result<i64, AssembleError> {
    let folded = expr.simplify(labels, true).map_err(not_foldable)?;
    let value = folded
        .as_constant()
        .expect("full simplify always yields a Constant");
    if value < 0 {
        return Err(negative(value));
    }
    Ok(value)
}

fn lower_directive(
    d: Directive,
    code: &mut Vec<Expression>,
    labels: &HashMap<Reference, Expression>,
    stack: &mut Vec<Command>,
    names: &mut NameGen,
) -> Result<(), AssembleError> {
    match d {
        Directive::Ints(values) => code.extend(values),

        Directive::IntsString(body) => {
            let points = escape::decode_string(&body)?;
            code.extend(points.into_iter().map(Expression::Constant));
        }

        Directive::Zeros(len) => {
            let n = fold_nonnegative(
                &len,
                labels,
                AssembleError::ZerosNotFoldable,
                AssembleError::ZerosNegative,
            )?;
            code.extend(std::iter::repeat(Expression::Constant(0)).take(n as usize));
        }

        Directive::Inc(p) => push_in_order(
            stack,
            vec![add(
                OpCode::Add,
                vec![p.clone(), Parameter::immediate(Expression::Constant(1)), p],
            )],
        ),

        Directive::Dec(p) => push_in_order(
            stack,
            vec![add(
                OpCode::Add,
                vec![p.clone(), Parameter::immediate(Expression::Constant(-1)), p],
            )],
        ),

        Directive::Mov { src, dest, size } => {
            let n = fold_nonnegative(
                &size,
                labels,
                AssembleError::MovSizeNotFoldable,
                AssembleError::MovSizeNegative,
            )?;
            let mut replacement = Vec::with_capacity(n as usize);
            for i in 0..n {
                let src_i = if src.mode == Mode::Immediate {
                    src.clone()
                } else {
                    Parameter::new(src.mode, src.value.clone() + i)
                };
                let dest_i = Parameter::new(dest.mode, dest.value.clone() + i);
                replacement.push(add(
                    OpCode::Add,
                    vec![src_i, Parameter::immediate(Expression::Constant(0)), dest_i],
                ));
            }
            push_in_order(stack, replacement);
        }

        Directive::Jmp(dest) => push_in_order(
            stack,
            vec![add(
                OpCode::Jnz,
                vec![Parameter::immediate(Expression::Constant(1)), dest],
            )],
        ),

        Directive::Push { value, size } => {
            let mut replacement = Vec::new();
            if let Some(v) = value {
                replacement.push(directive(Directive::Mov {
                    src: v,
                    dest: Parameter::relative(Expression::Constant(0)),
                    size: size.clone(),
                }));
            }
            replacement.push(add(OpCode::IncB, vec![Parameter::immediate(size)]));
            push_in_order(stack, replacement);
        }

        Directive::Pop { dest, size } => {
            let neg_size = Expression::subtract(Expression::Constant(0), size.clone());
            let mut replacement = vec![add(OpCode::IncB, vec![Parameter::immediate(neg_size)])];
            if let Some(d) = dest {
                replacement.push(directive(Directive::Mov {
                    src: Parameter::relative(Expression::Constant(0)),
                    dest: d,
                    size,
                }));
            }
            push_in_order(stack, replacement);
        }

        Directive::Call(dest) => {
            let r = names.fresh();
            push_in_order(
                stack,
                vec![
                    directive(Directive::Push {
                        value: Some(Parameter::immediate(crate::command::label_reference(
                            r.clone(),
                        ))),
                        size: Expression::Constant(1),
                    }),
                    directive(Directive::Jmp(dest)),
                    Command::Label(r),
                ],
            );
        }

        Directive::Ret => push_in_order(
            stack,
            vec![
                directive(Directive::Pop { dest: None, size: Expression::Constant(1) }),
                directive(Directive::Jmp(Parameter::relative(Expression::Constant(0)))),
            ],
        ),

        // A LOAD reads an address out of `src_ptr` and fetches memory at
        // that address. No opcode reads through an indirection, so this
        // self-modifies: the first MOV patches the *source* parameter word
        // (offset L+1) of the second MOV, whose own source is an
        // otherwise-meaningless `-1` placeholder. See `SPEC_FULL.md` §4.D.
        Directive::Load { src_ptr, dest } => {
            let l = names.fresh();
            push_in_order(
                stack,
                vec![
                    directive(Directive::Mov {
                        src: src_ptr,
                        dest: Parameter::absolute(crate::command::label_reference(l.clone()) + 1),
                        size: Expression::Constant(1),
                    }),
                    Command::Label(l),
                    directive(Directive::Mov {
                        src: Parameter::absolute(Expression::Constant(-1)),
                        dest,
                        size: Expression::Constant(1),
                    }),
                ],
            );
        }

        // The STORE analogue: the patched slot is the second MOV's
        // *destination* parameter (offset L+3: a MOV of size 1 expands to a
        // single ADD with op word at L and three parameters at L+1..L+3).
        Directive::Store { src, dest_ptr } => {
            let l = names.fresh();
            push_in_order(
                stack,
                vec![
                    directive(Directive::Mov {
                        src: dest_ptr,
                        dest: Parameter::absolute(crate::command::label_reference(l.clone()) + 3),
                        size: Expression::Constant(1),
                    }),
                    Command::Label(l),
                    directive(Directive::Mov {
                        src,
                        dest: Parameter::absolute(Expression::Constant(-1)),
                        size: Expression::Constant(1),
                    }),
                ],
            );
        }
    }
    Ok(())
}

/// Final pass: every emitted word must fully resolve to a constant now that
/// every label has been bound.
fn resolve(code: &[Expression], labels: &HashMap<Reference, Expression>) -> Result<Vec<i64>, AssembleError> {
    code.iter()
        .map(|word| {
            let simplified = word
                .simplify(labels, true)
                .map_err(AssembleError::UnresolvedReference)?;
            Ok(simplified.as_constant().expect("full simplify always yields a Constant"))
        })
        .collect()
}
