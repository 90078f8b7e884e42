//! Lowering of preprocessed formula text into a Rhai expression.
//!
//! The formula language is close to Rhai's expression syntax, with a few
//! differences handled here in a single left-to-right pass:
//!
//! - Number literals always lower to floats (`1` → `1.0`) so `/` never truncates
//! - Built-in calls take one array argument: `SUM(a, b)` → `SUM([a, b])`,
//!   with the argument count checked while lowering
//! - `IIF(c, t, e)` becomes `(if truthy(c) { t } else { e })` so only the
//!   chosen branch is evaluated
//! - `STR(n)` is replaced by the extracted string literal itself
//! - `=` and `<>` are comparisons (`==` and `!=`)
//! - Cell names and constants are canonicalised to upper case
//! - `#REF!` (a reference to a deleted row or column) is rejected

use crate::builtins::{Builtin, find_builtin, find_constant};

use super::cell_ref::CellRef;
use super::error::{CellError, ErrorKind};
use super::preprocess::DELETED_REF;

/// Builtin lowered to an `if` expression instead of a call.
const CONDITIONAL: &str = "IIF";

/// Open parenthesis being tracked while lowering.
struct Frame {
    builtin: Option<&'static Builtin>,
    commas: usize,
    has_args: bool,
}

impl Frame {
    fn is_conditional(&self) -> bool {
        self.builtin.is_some_and(|b| b.name == CONDITIONAL)
    }

    fn arg_count(&self) -> usize {
        if self.has_args { self.commas + 1 } else { 0 }
    }
}

struct Lowerer<'a> {
    src: &'a str,
    pos: usize,
    strings: &'a [String],
    out: String,
    frames: Vec<Frame>,
}

/// Lower formula text (ranges expanded, strings extracted) into Rhai source.
pub fn lower(text: &str, strings: &[String]) -> Result<String, CellError> {
    Lowerer {
        src: text,
        pos: 0,
        strings,
        out: String::with_capacity(text.len() + 8),
        frames: Vec::new(),
    }
    .run()
}

impl<'a> Lowerer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn mark_argument(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.has_args = true;
        }
    }

    fn run(mut self) -> Result<String, CellError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.out.push(c);
                self.pos += c.len_utf8();
                continue;
            }

            match c {
                ',' => {
                    let separator = match self.frames.last_mut() {
                        Some(frame) => {
                            frame.commas += 1;
                            match (frame.is_conditional(), frame.commas) {
                                (true, 1) => ") {",
                                (true, 2) => "} else {",
                                _ => ",",
                            }
                        }
                        None => ",",
                    };
                    self.out.push_str(separator);
                    self.pos += 1;
                }
                ')' => self.close_paren()?,
                _ => {
                    self.mark_argument();
                    match c {
                        '0'..='9' => self.number(),
                        '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                            self.number()
                        }
                        c if c.is_ascii_alphabetic() || c == '_' => self.identifier()?,
                        '(' => {
                            self.frames.push(Frame {
                                builtin: None,
                                commas: 0,
                                has_args: false,
                            });
                            self.out.push('(');
                            self.pos += 1;
                        }
                        '#' if self.rest().starts_with(DELETED_REF) => {
                            return Err(CellError::unrecognized(DELETED_REF));
                        }
                        '"' => {
                            // Unterminated literal; Rhai reports it as a syntax error.
                            self.out.push_str(self.rest());
                            self.pos = self.src.len();
                        }
                        '=' | '<' | '>' | '!' => self.operator(c),
                        _ => {
                            self.out.push(c);
                            self.pos += c.len_utf8();
                        }
                    }
                }
            }
        }

        Ok(self.out)
    }

    fn close_paren(&mut self) -> Result<(), CellError> {
        self.pos += 1;
        let Some(frame) = self.frames.pop() else {
            self.out.push(')');
            return Ok(());
        };
        let Some(builtin) = frame.builtin else {
            self.out.push(')');
            return Ok(());
        };
        if !builtin.arity.accepts(frame.arg_count()) {
            return Err(CellError::new(
                ErrorKind::ParameterCount,
                builtin.arity_message(),
            ));
        }
        self.out
            .push_str(if frame.is_conditional() { "})" } else { "])" });
        Ok(())
    }

    /// Comparison and logical operators; `=` means equality.
    fn operator(&mut self, c: char) {
        let next = self.peek_at(1);
        let (lowered, len) = match (c, next) {
            ('=', Some('=')) => ("==", 2),
            ('=', _) => ("==", 1),
            ('<', Some('>')) => ("!=", 2),
            ('<', Some('=')) => ("<=", 2),
            ('>', Some('=')) => (">=", 2),
            ('!', Some('=')) => ("!=", 2),
            ('<', _) => ("<", 1),
            ('>', _) => (">", 1),
            _ => ("!", 1),
        };
        self.out.push_str(lowered);
        self.pos += len;
    }

    /// Number literal, normalised to a Rhai float literal.
    fn number(&mut self) {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let int_part = &self.src[start..end];

        let mut frac_part = None;
        if end < bytes.len() && bytes[end] == b'.' {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            frac_part = Some(&self.src[frac_start..frac_end]);
            end = frac_end;
        }

        let mut exponent = None;
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            let digits_start = exp_end;
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            if exp_end > digits_start {
                exponent = Some(&self.src[end + 1..exp_end]);
                end = exp_end;
            }
        }

        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac_part = match frac_part {
            Some(f) if !f.is_empty() => f,
            _ => "0",
        };
        self.out.push_str(int_part);
        self.out.push('.');
        self.out.push_str(frac_part);
        if let Some(exp) = exponent {
            self.out.push('e');
            self.out.push_str(exp);
        }
        self.pos = end;
    }

    fn identifier(&mut self) -> Result<(), CellError> {
        let src = self.src;
        let start = self.pos;
        let len = src[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(src.len() - start);
        let name = &src[start..start + len];
        self.pos += len;

        let after_ws = self.rest().trim_start();
        if after_ws.starts_with('(') {
            return self.call(name, after_ws);
        }

        if let Some(constant) = find_constant(name) {
            self.out.push_str(constant.name);
        } else if let Some(cell) = CellRef::from_str(name) {
            self.out.push_str(&cell.to_string());
        } else {
            // Left for the evaluator to report as an unknown identifier.
            self.out.push_str(name);
        }
        Ok(())
    }

    /// Function call: `name` has been consumed, `after` starts at the `(`.
    fn call(&mut self, name: &str, after: &'a str) -> Result<(), CellError> {
        let Some(builtin) = find_builtin(name) else {
            return Err(CellError::new(
                ErrorKind::Evaluation,
                format!("Unknown function '{}'", name),
            ));
        };

        if builtin.name == "STR" {
            if let Some((literal, consumed)) = self.string_literal(after)? {
                self.out.push_str(&literal);
                self.pos = self.src.len() - after.len() + consumed;
                return Ok(());
            }
        }

        self.pos = self.src.len() - after.len() + 1;
        if builtin.name == CONDITIONAL {
            self.out.push_str("(if truthy(");
        } else {
            self.out.push_str(builtin.name);
            self.out.push_str("([");
        }
        self.frames.push(Frame {
            builtin: Some(builtin),
            commas: 0,
            has_args: false,
        });
        Ok(())
    }

    /// Resolve `(n)` after `STR` to a quoted Rhai string. Returns the literal and
    /// the number of bytes consumed, or None when the argument is not a plain index.
    fn string_literal(&self, after: &str) -> Result<Option<(String, usize)>, CellError> {
        let Some(close) = after.find(')') else {
            return Ok(None);
        };
        let Ok(index) = after[1..close].trim().parse::<usize>() else {
            return Ok(None);
        };
        let Some(text) = self.strings.get(index) else {
            return Err(CellError::new(
                ErrorKind::Evaluation,
                format!("Unknown string {}", index),
            ));
        };

        let mut literal = String::with_capacity(text.len() + 2);
        literal.push('"');
        for ch in text.chars() {
            match ch {
                '\\' => literal.push_str("\\\\"),
                '"' => literal.push_str("\\\""),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                '\t' => literal.push_str("\\t"),
                other => literal.push(other),
            }
        }
        literal.push('"');
        Ok(Some((literal, close + 1)))
    }
}
