// SPDX: CC0-1.0

pub mod eval;
pub mod lex;
pub mod parse;
pub mod render;
pub mod shell;
pub mod stdlib;
pub mod store;
pub mod sync;

use core::{fmt, ops::Range};

pub type Number = f64;

/// Expression used when the fragment store is empty at startup.
pub const DEFAULT_EXPR: &str = "sin(x+t)*x";

/// Number of vertices in the sampled polyline.
pub const SAMPLE_COUNT: usize = 100;

/// Clock advance per animation tick.
pub const TIME_INCREMENT: Number = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

/// The region of math space projected onto the drawing surface.
/// Fixed for the lifetime of the process; there is no zoom or pan.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewWindow {
    pub x: Range<Number>,
    pub y: Range<Number>,
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            x: -10.0..10.0,
            y: -10.0..10.0,
        }
    }
}

impl fmt::Display for ViewWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewWindow")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .finish()
    }
}

/// Drawing surface dimensions in pixels (character cells for a terminal
/// surface).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}
