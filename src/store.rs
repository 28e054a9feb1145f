// SPDX: CC0-1.0

//! The single source of truth for the current expression: its text and its
//! parsed, evaluable form. The two are replaced together or not at all, so
//! the renderer can never observe a program that disagrees with the text.

use crate::{
    eval::{self, Bindings, EvalErr, Program, Scope},
    lex::Lexer,
    parse::{self, ParseErr},
    stdlib, Number, DEFAULT_EXPR,
};
use std::sync::Arc;

#[derive(Debug)]
pub struct ExpressionStore {
    text: Arc<String>,
    program: Program,
    bindings: Bindings,
    stack: Vec<Number>, // evaluation scratch space, reused across samples
}

impl ExpressionStore {
    pub fn with_expression(text: &str) -> Result<Self, ParseErr> {
        let text = Arc::new(text.to_string());
        let program = parse::parse(Lexer::new(&text))?;
        Ok(Self {
            text,
            program,
            bindings: stdlib::bindings(),
            stack: Vec::new(),
        })
    }

    pub fn new() -> Self {
        // the default expression is a compile-time constant known to parse
        Self::with_expression(DEFAULT_EXPR).unwrap()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Stores `text` and re-parses it into the evaluable form. On a parse
    /// failure the previous expression and program are retained unchanged
    /// and the error is returned to the caller.
    pub fn set_expression(&mut self, text: &str) -> Result<(), ParseErr> {
        let new_text = Arc::new(text.to_string());
        let program = parse::parse(Lexer::new(&new_text))?;
        self.text = new_text;
        self.program = program;
        Ok(())
    }

    /// Binds `x` to `position` and `t` to `time`, then runs the stored
    /// program. Division by zero and friends come back as non-finite
    /// numbers, not errors; only undefined identifiers and misused
    /// functions fail.
    pub fn evaluate(&mut self, position: Number, time: Number) -> Result<Number, EvalErr> {
        let scope = Scope {
            x: position,
            t: time,
        };
        eval::eval(&self.program, &self.bindings, scope, &mut self.stack)
    }
}

impl Default for ExpressionStore {
    fn default() -> Self {
        Self::new()
    }
}
