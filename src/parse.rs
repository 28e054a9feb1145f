// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Assoc, Instr, InstrKind, OpKind, Program},
    lex::{LexErr, Lexer, Span, Tok, TokKind},
    Number,
};
use core::{fmt, num::ParseFloatError};
use std::sync::Arc;

#[derive(Debug)]
pub enum ParseErrKind {
    Lex,
    ParseNum(ParseFloatError),
    ParenMismatch,
    Empty,
    /// An operator or function is short of operands, e.g. `x+`.
    MissingOperands { needs: usize, found: usize },
    /// The expression leaves more than one value, e.g. `1 2`.
    TrailingOperands { found: usize },
}

impl fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "invalid character"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::Empty => write!(f, "empty expression"),
            Self::MissingOperands { needs, found } => write!(
                f,
                "expected {needs} operand{s} but found {found}",
                s = if *needs == 1 { "" } else { "s" }
            ),
            Self::TrailingOperands { found } => {
                write!(f, "expression reduces to {found} values instead of 1")
            }
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub kind: ParseErrKind,
    pub span: Span,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            kind: ParseErrKind::Lex,
            span: err.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ShuntKind {
    Op(OpKind),
    Fun,
    LParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Shunt {
    kind: ShuntKind,
    span: Span,
}

impl Shunt {
    fn into_instr(self, args: usize) -> Instr {
        let kind = match self.kind {
            ShuntKind::Op(kind) => InstrKind::Op(kind),
            ShuntKind::Fun => InstrKind::Call { args },
            ShuntKind::LParen => unreachable!("no parentheses in the output stack"),
        };
        Instr {
            kind,
            span: self.span,
        }
    }
}

pub fn parse(lex: Lexer<'_>) -> Result<Program, ParseErr> {
    let src = Arc::clone(lex.src());

    let mut out: Vec<Instr> = Vec::new(); // output
    let mut ops: Vec<Shunt> = Vec::new(); // operator stack
    let mut arg_commas: Vec<usize> = Vec::new(); // commas per open paren

    // whether the next token should start an operand; distinguishes unary
    // minus from subtraction
    let mut expect_operand = true;

    let mut lex = lex.peekable();
    while let Some(tok) = lex.next() {
        let Tok { kind, span } = tok?;
        match kind {
            TokKind::Number => {
                let num: Number = match span.text().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            kind: ParseErrKind::ParseNum(err),
                            span,
                        })
                    }
                };
                out.push(Instr {
                    kind: InstrKind::Push(num),
                    span,
                });
                expect_operand = false;
            }

            TokKind::Ident => {
                let is_call = matches!(
                    lex.peek(),
                    Some(Ok(next)) if next.kind == TokKind::LParen
                );
                if is_call {
                    ops.push(Shunt {
                        kind: ShuntKind::Fun,
                        span,
                    });
                } else {
                    out.push(Instr {
                        kind: InstrKind::Load,
                        span,
                    });
                    expect_operand = false;
                }
            }

            TokKind::Plus | TokKind::Minus | TokKind::Star | TokKind::Slash | TokKind::Caret => {
                let o1 = match kind {
                    TokKind::Plus => OpKind::Add,
                    TokKind::Minus if expect_operand => OpKind::Neg,
                    TokKind::Minus => OpKind::Sub,
                    TokKind::Star => OpKind::Mul,
                    TokKind::Slash => OpKind::Div,
                    TokKind::Caret => OpKind::Pow,
                    _ => unreachable!(),
                };
                // prefix minus takes nothing off the stack; nothing to its
                // left can apply before its operand arrives
                while o1 != OpKind::Neg {
                    let Some(top) = ops.last() else { break };
                    let pop = match top.kind {
                        ShuntKind::LParen | ShuntKind::Fun => false,
                        ShuntKind::Op(o2) => {
                            o2.precedence() > o1.precedence()
                                || (o2.precedence() == o1.precedence()
                                    && o1.assoc() == Assoc::Left)
                        }
                    };
                    if !pop {
                        break;
                    }
                    let top = ops.pop().unwrap();
                    out.push(top.into_instr(0));
                }
                ops.push(Shunt {
                    kind: ShuntKind::Op(o1),
                    span,
                });
                expect_operand = true;
            }

            TokKind::Comma => {
                while let Some(top) = ops.last() {
                    if top.kind == ShuntKind::LParen {
                        break;
                    }
                    let top = ops.pop().unwrap();
                    out.push(top.into_instr(0));
                }
                if let Some(commas) = arg_commas.last_mut() {
                    *commas += 1;
                }
                expect_operand = true;
            }

            TokKind::LParen => {
                ops.push(Shunt {
                    kind: ShuntKind::LParen,
                    span,
                });
                arg_commas.push(0);
                expect_operand = true;
            }

            TokKind::RParen => {
                while let Some(top) = ops.last() {
                    if top.kind == ShuntKind::LParen {
                        break;
                    }
                    let top = ops.pop().unwrap();
                    out.push(top.into_instr(0));
                }

                match ops.pop() {
                    Some(open) if open.kind == ShuntKind::LParen => {}
                    _ => {
                        return Err(ParseErr {
                            kind: ParseErrKind::ParenMismatch,
                            span,
                        });
                    }
                }

                let commas = arg_commas.pop().unwrap_or(0);
                let args = commas + usize::from(!expect_operand);

                // a function identifier directly below the parenthesis makes
                // this a call
                if let Some(top) = ops.last() {
                    if top.kind == ShuntKind::Fun {
                        let top = ops.pop().unwrap();
                        out.push(top.into_instr(args));
                    }
                }
                expect_operand = false;
            }
        }
    }

    while let Some(op) = ops.pop() {
        if op.kind == ShuntKind::LParen {
            return Err(ParseErr {
                kind: ParseErrKind::ParenMismatch,
                span: op.span,
            });
        }
        out.push(op.into_instr(0));
    }

    if out.is_empty() {
        return Err(ParseErr {
            kind: ParseErrKind::Empty,
            span: Span::all(src),
        });
    }

    check(&out, &src)?;
    Ok(Program::new(out))
}

/// Walks the postfix program tracking stack depth so that malformed input
/// like `x+` or `1 2` is rejected at parse time, before it can replace the
/// store's current expression. Arity of known functions is checked later,
/// at evaluation time.
fn check(instrs: &[Instr], src: &Arc<String>) -> Result<(), ParseErr> {
    let mut depth: usize = 0;
    for instr in instrs {
        match instr.kind {
            InstrKind::Push(_) | InstrKind::Load => depth += 1,

            InstrKind::Op(kind) => {
                let needs = kind.arity();
                if depth < needs {
                    return Err(ParseErr {
                        kind: ParseErrKind::MissingOperands {
                            needs,
                            found: depth,
                        },
                        span: instr.span.clone(),
                    });
                }
                depth = depth - needs + 1;
            }

            InstrKind::Call { args } => {
                if depth < args {
                    return Err(ParseErr {
                        kind: ParseErrKind::MissingOperands {
                            needs: args,
                            found: depth,
                        },
                        span: instr.span.clone(),
                    });
                }
                depth = depth - args + 1;
            }
        }
    }
    if depth != 1 {
        return Err(ParseErr {
            kind: ParseErrKind::TrailingOperands { found: depth },
            span: Span::all(Arc::clone(src)),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> Result<Program, ParseErr> {
        let src = Arc::new(src.to_string());
        parse(Lexer::new(&src))
    }

    fn dump(prog: &Program) -> Vec<String> {
        prog.instrs().map(|instr| instr.to_string()).collect()
    }

    #[test]
    fn precedence_orders_the_output() {
        let prog = compile("1+2*3").unwrap();
        assert_eq!(
            dump(&prog),
            ["push 1", "push 2", "push 3", "apply 'mul'", "apply 'add'"]
        );
    }

    #[test]
    fn unary_minus_at_the_start() {
        let prog = compile("-x+1").unwrap();
        assert_eq!(
            dump(&prog),
            ["load 'x'", "apply 'neg'", "push 1", "apply 'add'"]
        );
    }

    #[test]
    fn unary_minus_after_operator() {
        let prog = compile("2*-x").unwrap();
        assert_eq!(
            dump(&prog),
            ["push 2", "load 'x'", "apply 'neg'", "apply 'mul'"]
        );
    }

    #[test]
    fn call_arguments_are_counted() {
        let prog = compile("log(x, 2)").unwrap();
        assert_eq!(
            dump(&prog),
            ["load 'x'", "push 2", "call 'log' with 2 args"]
        );
    }

    #[test]
    fn unary_minus_in_an_exponent() {
        let prog = compile("x^-2").unwrap();
        assert_eq!(
            dump(&prog),
            ["load 'x'", "push 2", "apply 'neg'", "apply 'pow'"]
        );
    }

    #[test]
    fn nested_calls() {
        let prog = compile("sin(cos(t))").unwrap();
        assert_eq!(
            dump(&prog),
            ["load 't'", "call 'cos' with 1 args", "call 'sin' with 1 args"]
        );
    }

    #[test]
    fn unclosed_paren_is_rejected() {
        let err = compile("(x+1").unwrap_err();
        assert!(matches!(err.kind, ParseErrKind::ParenMismatch));
    }

    #[test]
    fn stray_close_paren_is_rejected() {
        let err = compile("x+1)").unwrap_err();
        assert!(matches!(err.kind, ParseErrKind::ParenMismatch));
    }

    #[test]
    fn trailing_operator_is_rejected() {
        let err = compile("x+").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrKind::MissingOperands { needs: 2, found: 1 }
        ));
    }

    #[test]
    fn adjacent_operands_are_rejected() {
        let err = compile("1 2").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrKind::TrailingOperands { found: 2 }
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = compile("").unwrap_err();
        assert!(matches!(err.kind, ParseErrKind::Empty));
    }

    #[test]
    fn invalid_character_is_a_parse_error() {
        let err = compile("x$2").unwrap_err();
        assert!(matches!(err.kind, ParseErrKind::Lex));
        assert_eq!(err.span.text(), "$");
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = compile("1.2.3").unwrap_err();
        assert!(matches!(err.kind, ParseErrKind::ParseNum(_)));
    }
}
