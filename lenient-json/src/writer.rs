//! Streaming JSON writer.

use alloc::string::String;
use alloc::vec::Vec;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object { members: usize },
    Array { members: usize },
}

/// Writes JSON tokens into an in-memory string.
///
/// Commas, colons and (when pretty-printing) newlines and indentation are
/// inserted automatically. The writer does not check that names only appear
/// inside objects; callers drive it in a well-formed order.
#[derive(Debug)]
pub struct JsonWriter {
    out: String,
    indent: Option<&'static str>,
    frames: Vec<Frame>,
    after_name: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    /// A writer producing compact output.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: None,
            frames: Vec::new(),
            after_name: false,
        }
    }

    /// A writer indenting nested values by two spaces.
    pub fn pretty() -> Self {
        Self {
            indent: Some("  "),
            ..Self::new()
        }
    }

    /// Whether this writer pretty-prints.
    pub fn is_pretty(&self) -> bool {
        self.indent.is_some()
    }

    /// Returns the output written so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consumes the writer, returning its output.
    pub fn into_string(self) -> String {
        self.out
    }

    /// Writes `{`.
    pub fn begin_object(&mut self) {
        self.before_value();
        self.out.push('{');
        self.frames.push(Frame::Object { members: 0 });
    }

    /// Writes `}`.
    pub fn end_object(&mut self) {
        self.close('}');
    }

    /// Writes `[`.
    pub fn begin_array(&mut self) {
        self.before_value();
        self.out.push('[');
        self.frames.push(Frame::Array { members: 0 });
    }

    /// Writes `]`.
    pub fn end_array(&mut self) {
        self.close(']');
    }

    /// Writes a property name. The next write is its value.
    pub fn name(&mut self, name: &str) {
        self.next_member();
        write_json_string(&mut self.out, name);
        self.out.push(':');
        if self.indent.is_some() {
            self.out.push(' ');
        }
        self.after_name = true;
    }

    /// Writes `null`.
    pub fn null(&mut self) {
        self.before_value();
        self.out.push_str("null");
    }

    /// Writes a boolean.
    pub fn bool(&mut self, value: bool) {
        self.before_value();
        self.out.push_str(if value { "true" } else { "false" });
    }

    /// Writes an integer.
    pub fn i64(&mut self, value: i64) {
        self.before_value();
        self.out.push_str(itoa::Buffer::new().format(value));
    }

    /// Writes a 32-bit float. Non-finite values are written as `null`.
    pub fn f32(&mut self, value: f32) {
        self.before_value();
        if value.is_finite() {
            self.out.push_str(ryu::Buffer::new().format_finite(value));
        } else {
            self.out.push_str("null");
        }
    }

    /// Writes a 64-bit float. Non-finite values are written as `null`.
    pub fn f64(&mut self, value: f64) {
        self.before_value();
        if value.is_finite() {
            self.out.push_str(ryu::Buffer::new().format_finite(value));
        } else {
            self.out.push_str("null");
        }
    }

    /// Writes a decimal as a number literal, keeping its scale.
    pub fn decimal(&mut self, value: &Decimal) {
        self.before_value();
        self.out.push_str(&value.to_string());
    }

    /// Writes a string.
    pub fn string(&mut self, value: &str) {
        self.before_value();
        write_json_string(&mut self.out, value);
    }

    /// Writes an untyped JSON value.
    ///
    /// Nested arrays and objects are walked with an explicit stack, so any
    /// depth can be written.
    pub fn json_value(&mut self, value: &serde_json::Value) {
        enum Pending<'v> {
            Items(core::slice::Iter<'v, serde_json::Value>),
            Members(serde_json::map::Iter<'v>),
        }

        let mut stack: Vec<Pending<'_>> = Vec::new();
        let mut next = Some(value);
        loop {
            match next.take() {
                Some(serde_json::Value::Array(items)) => {
                    self.begin_array();
                    stack.push(Pending::Items(items.iter()));
                }
                Some(serde_json::Value::Object(map)) => {
                    self.begin_object();
                    stack.push(Pending::Members(map.iter()));
                }
                Some(serde_json::Value::Null) => self.null(),
                Some(serde_json::Value::Bool(b)) => self.bool(*b),
                Some(serde_json::Value::Number(n)) => {
                    self.before_value();
                    self.out.push_str(&n.to_string());
                }
                Some(serde_json::Value::String(s)) => self.string(s),
                None => {}
            }

            let Some(top) = stack.last_mut() else {
                return;
            };
            match top {
                Pending::Items(items) => match items.next() {
                    Some(item) => next = Some(item),
                    None => {
                        stack.pop();
                        self.end_array();
                    }
                },
                Pending::Members(members) => match members.next() {
                    Some((key, item)) => {
                        self.name(key);
                        next = Some(item);
                    }
                    None => {
                        stack.pop();
                        self.end_object();
                    }
                },
            }
        }
    }

    fn before_value(&mut self) {
        if self.after_name {
            self.after_name = false;
            return;
        }
        if let Some(Frame::Array { .. }) = self.frames.last() {
            self.next_member();
        }
    }

    fn next_member(&mut self) {
        let Some(Frame::Object { members } | Frame::Array { members }) = self.frames.last_mut()
        else {
            return;
        };
        if *members > 0 {
            self.out.push(',');
        }
        *members += 1;
        self.newline();
    }

    fn close(&mut self, bracket: char) {
        let members = match self.frames.pop() {
            Some(Frame::Object { members } | Frame::Array { members }) => members,
            None => 0,
        };
        if members > 0 {
            self.newline();
        }
        self.out.push(bracket);
    }

    fn newline(&mut self) {
        if let Some(indent) = self.indent {
            self.out.push('\n');
            for _ in 0..self.frames.len() {
                self.out.push_str(indent);
            }
        }
    }
}

/// Escapes and writes a JSON string literal.
fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    let mut run_start = 0;
    for (i, c) in s.char_indices() {
        if !needs_escape(c) {
            continue;
        }
        out.push_str(&s[run_start..i]);
        write_json_escaped_char(out, c);
        run_start = i + c.len_utf8();
    }
    out.push_str(&s[run_start..]);
    out.push('"');
}

fn needs_escape(c: char) -> bool {
    c == '"' || c == '\\' || c.is_ascii_control()
}

fn write_json_escaped_char(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0C}' => out.push_str("\\f"),
        c if c.is_ascii_control() => {
            const HEX: &[u8; 16] = b"0123456789abcdef";
            let code_point = c as usize;
            out.push_str("\\u00");
            out.push(HEX[(code_point >> 4) & 0xF] as char);
            out.push(HEX[code_point & 0xF] as char);
        }
        c => out.push(c),
    }
}
