// SPDX: CC0-1.0

use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

/// Region of the source expression, kept alongside tokens and errors so
/// diagnostics can underline the offending text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl Span {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    fn grow(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokKind {
    Number,
    Ident,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,
    LParen,
    RParen,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
}

/// The lexer recognizes numbers, alphabetic identifiers and the symbols
/// `+ - * / ^ , ( )`; anything else is an invalid character.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub span: Span,
}

impl fmt::Display for LexErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid character '{}'", self.span.text())
    }
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            has_errored: false,
        }
    }

    pub fn src(&self) -> &'src Arc<String> {
        self.src
    }

    fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_ascii_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn consume_symbol(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let kind = match chr {
            '+' => TokKind::Plus,
            '-' => TokKind::Minus,
            '*' => TokKind::Star,
            '/' => TokKind::Slash,
            '^' => TokKind::Caret,
            ',' => TokKind::Comma,
            '(' => TokKind::LParen,
            ')' => TokKind::RParen,
            _ => return None,
        };
        self.cur.next().unwrap(); // consume because we only peeked
        Some(Tok {
            kind,
            span: Span::new(Arc::clone(self.src), idx, 1),
        })
    }

    fn consume_while<P>(&mut self, start: usize, kind: TokKind, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut span = Span::new(Arc::clone(self.src), start, 0);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                span.grow(chr.len_utf8());
                self.cur.next().unwrap();
            } else {
                break;
            }
        }
        if span.is_empty() {
            None
        } else {
            Some(Tok { kind, span })
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        if let Some(tok) = self.consume_symbol() {
            Some(Ok(tok))
        } else if let Some(tok) =
            self.consume_while(next_idx, TokKind::Ident, |chr| chr.is_ascii_alphabetic())
        {
            Some(Ok(tok))
        } else if let Some(tok) = self.consume_while(next_idx, TokKind::Number, |chr| {
            chr.is_ascii_digit() || chr == '.'
        }) {
            Some(Ok(tok))
        } else {
            self.has_errored = true;
            Some(Err(LexErr {
                span: Span::new(Arc::clone(self.src), next_idx, next_chr.len_utf8()),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| tok.expect("expected valid token").kind)
            .collect()
    }

    #[test]
    fn default_expression_tokens() {
        use TokKind::*;
        assert_eq!(
            kinds("sin(x+t)*x"),
            [Ident, LParen, Ident, Plus, Ident, RParen, Star, Ident]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        use TokKind::*;
        assert_eq!(kinds("  1.5 ^  x "), [Number, Caret, Ident]);
    }

    #[test]
    fn invalid_character_stops_the_stream() {
        let src = Arc::new("x # t".to_string());
        let toks: Vec<_> = Lexer::new(&src).collect();
        assert_eq!(toks.len(), 2);
        assert!(toks[0].is_ok());
        let err = toks[1].as_ref().expect_err("expected lex error");
        assert_eq!(err.span.text(), "#");
        assert_eq!(err.span.start(), 2);
    }
}
