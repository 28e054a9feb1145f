// SPDX: CC0-1.0

use crate::{
    eval::{Binding, Bindings, Fun},
    Number,
};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

/// Domain sample position, bound per evaluation.
pub const X: &str = "x";
/// Elapsed animation time, bound per evaluation.
pub const T: &str = "t";

pub fn bindings() -> Bindings {
    let mut ret = HashMap::new();

    ret.insert("abs", Binding::Fun(Fun::new(1, abs)));
    ret.insert("sqrt", Binding::Fun(Fun::new(1, sqrt)));
    ret.insert("exp", Binding::Fun(Fun::new(1, exp)));
    ret.insert("ln", Binding::Fun(Fun::new(1, ln)));
    ret.insert("log", Binding::Fun(Fun::new(2, log)));

    // trig
    ret.insert("sin", Binding::Fun(Fun::new(1, sin)));
    ret.insert("cos", Binding::Fun(Fun::new(1, cos)));
    ret.insert("tan", Binding::Fun(Fun::new(1, tan)));
    ret.insert("asin", Binding::Fun(Fun::new(1, arcsin)));
    ret.insert("acos", Binding::Fun(Fun::new(1, arccos)));
    ret.insert("atan", Binding::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin", Binding::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos", Binding::Fun(Fun::new(1, arccos)));
    ret.insert("arctan", Binding::Fun(Fun::new(1, arctan)));

    ret.insert("pi", Binding::Const(consts::PI));
    ret.insert("tau", Binding::Const(consts::TAU));
    ret.insert("e", Binding::Const(consts::E));
    ret
}

pub fn abs(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.abs()
}

pub fn sqrt(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.sqrt()
}

pub fn exp(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.exp()
}

pub fn ln(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.ln()
}

pub fn log(args: &[Number]) -> Number {
    let &[x, base] = args else { unreachable!() };
    x.log(base)
}

pub fn sin(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.sin()
}

pub fn cos(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.cos()
}

pub fn tan(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.tan()
}

pub fn arcsin(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.asin()
}

pub fn arccos(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.acos()
}

pub fn arctan(args: &[Number]) -> Number {
    let &[x] = args else { unreachable!() };
    x.atan()
}
