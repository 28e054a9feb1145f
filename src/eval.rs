// SPDX: CC0-1.0

use crate::{lex::Span, stdlib, Number};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
}

impl OpKind {
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Sub => 2,
            Self::Mul | Self::Div => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    pub const fn assoc(&self) -> Assoc {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div => Assoc::Left,
            Self::Neg | Self::Pow => Assoc::Right,
        }
    }

    pub const fn arity(&self) -> usize {
        match self {
            Self::Neg => 1,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Pow => 2,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
        }
    }

    pub fn apply(&self, args: &[Number]) -> Number {
        match self {
            Self::Neg => -args[0],
            Self::Add => args[0] + args[1],
            Self::Sub => args[0] - args[1],
            Self::Mul => args[0] * args[1],
            Self::Div => args[0] / args[1],
            Self::Pow => args[0].powf(args[1]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InstrKind {
    Push(Number),
    Op(OpKind),
    /// Load a variable or constant named by the instruction's span.
    Load,
    /// Call the function named by the instruction's span with `args`
    /// arguments gathered syntactically by the parser.
    Call { args: usize },
}

#[derive(Clone, Debug)]
pub struct Instr {
    pub kind: InstrKind,
    pub span: Span,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstrKind::Push(val) => write!(f, "push {val}"),
            InstrKind::Op(kind) => write!(f, "apply '{}'", kind.name()),
            InstrKind::Load => write!(f, "load '{}'", self.span.text()),
            InstrKind::Call { args } => {
                write!(f, "call '{}' with {args} args", self.span.text())
            }
        }
    }
}

#[derive(Debug)]
pub struct Fun {
    pub arity: usize,
    pub call: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(arity: usize, call: fn(&[Number]) -> Number) -> Self {
        Self { arity, call }
    }
}

#[derive(Debug)]
pub enum Binding {
    Const(Number),
    Fun(Fun),
}

pub type Bindings = HashMap<&'static str, Binding>;

/// The evaluation context: exactly two variables, bound immediately before
/// each evaluation and never carried over from a previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scope {
    pub x: Number,
    pub t: Number,
}

impl Scope {
    pub fn lookup(&self, name: &str) -> Option<Number> {
        match name {
            stdlib::X => Some(self.x),
            stdlib::T => Some(self.t),
            _ => None,
        }
    }
}

/// Evaluable form of an expression: a postfix instruction sequence produced
/// by the parser and reusable across evaluations without re-parsing.
#[derive(Debug)]
pub struct Program {
    pub(crate) instrs: Vec<Instr>,
}

impl Program {
    #[inline]
    pub(crate) const fn new(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }

    #[inline]
    pub fn instrs(&self) -> core::slice::Iter<'_, Instr> {
        self.instrs.iter()
    }
}

#[derive(Debug)]
pub enum EvalErrKind {
    Empty,
    MissingArgs {
        name: String,
        arity: usize,
        found: usize,
    },
    NotAFunction {
        name: String,
    },
    UndefinedIdent {
        name: String,
    },
    Unbalanced {
        found: usize,
    },
}

#[derive(Debug)]
pub struct EvalErr {
    pub kind: EvalErrKind,
    pub span: Option<Span>, // if none, associated with end-of-program checking
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EvalErrKind::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrKind::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrKind::NotAFunction { name } => {
                write!(f, "'{name}' is not a function")
            }

            EvalErrKind::UndefinedIdent { name } => {
                write!(f, "undefined identifier '{name}'")
            }

            EvalErrKind::Unbalanced { found } => write!(
                f,
                "expected 1 value on the stack after evaluation but found {found}"
            ),
        }
    }
}

impl std::error::Error for EvalErr {}

/// Runs `prog` against the given bindings and variable scope. `stack` is
/// scratch space reused between calls; it is cleared on entry.
pub fn eval(
    prog: &Program,
    bindings: &Bindings,
    scope: Scope,
    stack: &mut Vec<Number>,
) -> Result<Number, EvalErr> {
    fn take_args(
        stack: &mut Vec<Number>,
        span: &Span,
        name: &str,
        arity: usize,
    ) -> Result<Vec<Number>, EvalErr> {
        let len = stack.len();
        if len < arity {
            return Err(EvalErr {
                kind: EvalErrKind::MissingArgs {
                    name: name.to_string(),
                    arity,
                    found: len,
                },
                span: Some(span.clone()),
            });
        }
        Ok(stack.split_off(len - arity))
    }

    if prog.instrs.is_empty() {
        return Err(EvalErr {
            kind: EvalErrKind::Empty,
            span: None,
        });
    }

    stack.clear();

    for instr in &prog.instrs {
        match instr.kind {
            InstrKind::Push(num) => stack.push(num),

            InstrKind::Op(kind) => {
                let args = take_args(stack, &instr.span, kind.name(), kind.arity())?;
                stack.push(kind.apply(&args));
            }

            InstrKind::Load => {
                let name = instr.span.text();
                let val = if let Some(val) = scope.lookup(name) {
                    val
                } else {
                    match bindings.get(name) {
                        Some(Binding::Const(val)) => *val,
                        // a bare function name is not a value
                        Some(Binding::Fun(fun)) => {
                            return Err(EvalErr {
                                kind: EvalErrKind::MissingArgs {
                                    name: name.to_string(),
                                    arity: fun.arity,
                                    found: 0,
                                },
                                span: Some(instr.span.clone()),
                            });
                        }
                        None => {
                            return Err(EvalErr {
                                kind: EvalErrKind::UndefinedIdent {
                                    name: name.to_string(),
                                },
                                span: Some(instr.span.clone()),
                            });
                        }
                    }
                };
                stack.push(val);
            }

            InstrKind::Call { args: found } => {
                let name = instr.span.text();
                match bindings.get(name) {
                    Some(Binding::Fun(fun)) => {
                        if found != fun.arity {
                            return Err(EvalErr {
                                kind: EvalErrKind::MissingArgs {
                                    name: name.to_string(),
                                    arity: fun.arity,
                                    found,
                                },
                                span: Some(instr.span.clone()),
                            });
                        }
                        let args = take_args(stack, &instr.span, name, fun.arity)?;
                        stack.push((fun.call)(&args));
                    }
                    Some(Binding::Const(_)) => {
                        return Err(EvalErr {
                            kind: EvalErrKind::NotAFunction {
                                name: name.to_string(),
                            },
                            span: Some(instr.span.clone()),
                        });
                    }
                    None => {
                        let kind = if scope.lookup(name).is_some() {
                            EvalErrKind::NotAFunction {
                                name: name.to_string(),
                            }
                        } else {
                            EvalErrKind::UndefinedIdent {
                                name: name.to_string(),
                            }
                        };
                        return Err(EvalErr {
                            kind,
                            span: Some(instr.span.clone()),
                        });
                    }
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(EvalErr {
            kind: EvalErrKind::Unbalanced { found: stack.len() },
            span: None,
        });
    }
    Ok(stack.pop().unwrap())
}
