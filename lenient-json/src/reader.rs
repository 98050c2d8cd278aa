//! Pull-based JSON tokenizer.
//!
//! [`JsonReader`] walks a borrowed `&str` one token at a time. Strings without
//! escapes and number literals are returned as slices of the input; everything
//! is validated as it is read, so syntax errors surface at the token that
//! causes them, with line, column and the document path of the value.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use lenient_core::TokenKind;

/// A token read from the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// A property name, with escapes decoded.
    Name(Cow<'input, str>),
    /// A string value, with escapes decoded.
    String(Cow<'input, str>),
    /// A number literal, as written.
    Number(&'input str),
    /// `true` or `false`.
    Bool(bool),
    /// `null`
    Null,
    /// End of input.
    EndDocument,
}

impl Token<'_> {
    /// The kind of this token.
    pub const fn kind(&self) -> TokenKind {
        match self {
            Token::BeginObject => TokenKind::BeginObject,
            Token::EndObject => TokenKind::EndObject,
            Token::BeginArray => TokenKind::BeginArray,
            Token::EndArray => TokenKind::EndArray,
            Token::Name(_) => TokenKind::Name,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Bool(_) => TokenKind::Boolean,
            Token::Null => TokenKind::Null,
            Token::EndDocument => TokenKind::EndDocument,
        }
    }
}

/// What went wrong while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// A character that cannot start or continue a token here.
    UnexpectedChar(char),
    /// The input ended in the middle of a value.
    UnexpectedEof(&'static str),
    /// A malformed escape sequence inside a string.
    InvalidEscape,
    /// A raw control character inside a string.
    ControlCharacter,
    /// A malformed number literal.
    InvalidNumber,
    /// Non-whitespace input after the top-level value.
    TrailingCharacters,
    /// Objects and arrays nested deeper than the reader allows.
    DepthLimitExceeded(usize),
    /// A well-formed token of the wrong kind for the requested operation.
    UnexpectedToken {
        /// What the caller asked for.
        expected: &'static str,
        /// What was found.
        found: TokenKind,
    },
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ReadErrorKind::UnexpectedEof(ctx) => write!(f, "unexpected end of input {ctx}"),
            ReadErrorKind::InvalidEscape => f.write_str("invalid escape sequence"),
            ReadErrorKind::ControlCharacter => f.write_str("unescaped control character in string"),
            ReadErrorKind::InvalidNumber => f.write_str("invalid number"),
            ReadErrorKind::TrailingCharacters => f.write_str("trailing characters after document"),
            ReadErrorKind::DepthLimitExceeded(max) => {
                write!(f, "nesting deeper than {max} levels")
            }
            ReadErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
        }
    }
}

/// A syntax error, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    /// What went wrong.
    pub kind: ReadErrorKind,
    /// Byte offset into the input.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
    /// Document path of the value being read.
    pub path: String,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {} column {} path {}",
            self.kind, self.line, self.column, self.path
        )
    }
}

impl std::error::Error for ReadError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    /// Nothing read yet.
    First,
    /// At least one member read; a `,` or the closing bracket follows.
    Next,
    /// A name was read; `:` and a value follow.
    AfterName,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    state: ScopeState,
    name: Option<String>,
    index: usize,
}

/// Nesting depth accepted by [`JsonReader::new`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// A pull reader over a JSON document held in memory.
pub struct JsonReader<'input> {
    input: &'input str,
    pos: usize,
    scopes: Vec<Scope>,
    max_depth: usize,
    peeked: Option<Token<'input>>,
    root_read: bool,
}

impl<'input> JsonReader<'input> {
    /// Creates a reader positioned before the top-level value.
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            pos: 0,
            scopes: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            peeked: None,
            root_read: false,
        }
    }

    /// Limits how many objects and arrays may be open at once.
    ///
    /// Opening one more is a [`ReadErrorKind::DepthLimitExceeded`] error.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the kind of the next token without consuming it.
    pub fn peek(&mut self) -> Result<TokenKind, ReadError> {
        if self.peeked.is_none() {
            let token = self.scan()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().map_or(TokenKind::EndDocument, Token::kind))
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<Token<'input>, ReadError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Whether the current object or array has another member.
    pub fn has_next(&mut self) -> Result<bool, ReadError> {
        Ok(!matches!(
            self.peek()?,
            TokenKind::EndObject | TokenKind::EndArray | TokenKind::EndDocument
        ))
    }

    /// Consumes a `{`.
    pub fn begin_object(&mut self) -> Result<(), ReadError> {
        self.expect(TokenKind::BeginObject, "BEGIN_OBJECT")
    }

    /// Consumes a `}`.
    pub fn end_object(&mut self) -> Result<(), ReadError> {
        self.expect(TokenKind::EndObject, "END_OBJECT")
    }

    /// Consumes a `[`.
    pub fn begin_array(&mut self) -> Result<(), ReadError> {
        self.expect(TokenKind::BeginArray, "BEGIN_ARRAY")
    }

    /// Consumes a `]`.
    pub fn end_array(&mut self) -> Result<(), ReadError> {
        self.expect(TokenKind::EndArray, "END_ARRAY")
    }

    /// Consumes a `null`.
    pub fn next_null(&mut self) -> Result<(), ReadError> {
        self.expect(TokenKind::Null, "NULL")
    }

    /// Consumes a property name.
    pub fn next_name(&mut self) -> Result<Cow<'input, str>, ReadError> {
        match self.next_token()? {
            Token::Name(name) => Ok(name),
            other => Err(self.unexpected("NAME", other.kind())),
        }
    }

    /// Consumes one complete value, including everything nested inside it.
    ///
    /// When positioned on a property name, the name and its value are skipped.
    pub fn skip_value(&mut self) -> Result<(), ReadError> {
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::BeginObject | Token::BeginArray => depth += 1,
                Token::EndObject | Token::EndArray => {
                    if depth == 0 {
                        return Err(self.unexpected("a value", TokenKind::EndObject));
                    }
                    depth -= 1;
                }
                Token::Name(_) => continue,
                Token::EndDocument => {
                    return Err(self.error(ReadErrorKind::UnexpectedEof("while skipping a value")));
                }
                Token::String(_) | Token::Number(_) | Token::Bool(_) | Token::Null => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Path of the value most recently peeked or read, such as `$.tags[2]`.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for scope in &self.scopes {
            match scope.kind {
                ScopeKind::Object => {
                    if let Some(name) = &scope.name {
                        path.push('.');
                        path.push_str(name);
                    }
                }
                ScopeKind::Array if scope.state == ScopeState::First => {}
                ScopeKind::Array => {
                    path.push('[');
                    path.push_str(itoa::Buffer::new().format(scope.index));
                    path.push(']');
                }
            }
        }
        path
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ReadError> {
        let token = self.next_token()?;
        if token.kind() == kind {
            Ok(())
        } else {
            Err(self.unexpected(expected, token.kind()))
        }
    }

    pub(crate) fn unexpected(&self, expected: &'static str, found: TokenKind) -> ReadError {
        self.error(ReadErrorKind::UnexpectedToken { expected, found })
    }

    fn error(&self, kind: ReadErrorKind) -> ReadError {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: ReadErrorKind, offset: usize) -> ReadError {
        let offset = offset.min(self.input.len());
        let before = &self.input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        ReadError {
            kind,
            offset,
            line,
            column,
            path: self.path(),
        }
    }

    fn scan(&mut self) -> Result<Token<'input>, ReadError> {
        let Some(scope) = self.scopes.last_mut() else {
            if self.root_read {
                self.skip_whitespace();
                return match self.current() {
                    None => Ok(Token::EndDocument),
                    Some(_) => Err(self.error(ReadErrorKind::TrailingCharacters)),
                };
            }
            self.root_read = true;
            return self.scan_value();
        };

        match (scope.kind, scope.state) {
            (ScopeKind::Array, state) => {
                self.skip_whitespace();
                if self.current() == Some(b']') {
                    self.pos += 1;
                    self.scopes.pop();
                    return Ok(Token::EndArray);
                }
                if state == ScopeState::Next {
                    self.expect_byte(b',', "in array")?;
                }
                if let Some(scope) = self.scopes.last_mut() {
                    if scope.state == ScopeState::Next {
                        scope.index += 1;
                    }
                    scope.state = ScopeState::Next;
                }
                self.scan_value()
            }
            (ScopeKind::Object, ScopeState::AfterName) => {
                self.skip_whitespace();
                self.expect_byte(b':', "after property name")?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.state = ScopeState::Next;
                }
                self.scan_value()
            }
            (ScopeKind::Object, state) => {
                self.skip_whitespace();
                if self.current() == Some(b'}') {
                    self.pos += 1;
                    self.scopes.pop();
                    return Ok(Token::EndObject);
                }
                if state == ScopeState::Next {
                    self.expect_byte(b',', "in object")?;
                    self.skip_whitespace();
                }
                if self.current() != Some(b'"') {
                    return Err(self.unexpected_here("in object"));
                }
                let name = self.scan_string()?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.name = Some(name.clone().into_owned());
                    scope.state = ScopeState::AfterName;
                }
                Ok(Token::Name(name))
            }
        }
    }

    fn scan_value(&mut self) -> Result<Token<'input>, ReadError> {
        self.skip_whitespace();
        let Some(byte) = self.current() else {
            return Err(self.error(ReadErrorKind::UnexpectedEof("while reading a value")));
        };
        match byte {
            b'{' => {
                self.push_scope(ScopeKind::Object)?;
                Ok(Token::BeginObject)
            }
            b'[' => {
                self.push_scope(ScopeKind::Array)?;
                Ok(Token::BeginArray)
            }
            b'"' => self.scan_string().map(Token::String),
            b't' => self.scan_literal("true", Token::Bool(true)),
            b'f' => self.scan_literal("false", Token::Bool(false)),
            b'n' => self.scan_literal("null", Token::Null),
            b'-' | b'0'..=b'9' => self.scan_number().map(Token::Number),
            _ => Err(self.unexpected_here("while reading a value")),
        }
    }

    fn push_scope(&mut self, kind: ScopeKind) -> Result<(), ReadError> {
        if self.scopes.len() >= self.max_depth {
            return Err(self.error(ReadErrorKind::DepthLimitExceeded(self.max_depth)));
        }
        self.pos += 1;
        self.scopes.push(Scope {
            kind,
            state: ScopeState::First,
            name: None,
            index: 0,
        });
        Ok(())
    }

    fn current(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.current() {
            self.pos += 1;
        }
    }

    fn expect_byte(&mut self, expected: u8, context: &'static str) -> Result<(), ReadError> {
        if self.current() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected_here(context))
        }
    }

    fn unexpected_here(&self, context: &'static str) -> ReadError {
        match self.input[self.pos..].chars().next() {
            Some(c) => self.error(ReadErrorKind::UnexpectedChar(c)),
            None => self.error(ReadErrorKind::UnexpectedEof(context)),
        }
    }

    fn scan_literal(
        &mut self,
        literal: &'static str,
        token: Token<'input>,
    ) -> Result<Token<'input>, ReadError> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(token)
        } else {
            Err(self.unexpected_here("in literal"))
        }
    }

    fn scan_number(&mut self) -> Result<&'input str, ReadError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let digits = |pos: &mut usize| {
            let from = *pos;
            while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
                *pos += 1;
            }
            *pos - from
        };

        let mut pos = self.pos;
        if bytes.get(pos) == Some(&b'-') {
            pos += 1;
        }
        match bytes.get(pos) {
            Some(b'0') => pos += 1,
            Some(b'1'..=b'9') => {
                digits(&mut pos);
            }
            _ => return Err(self.error_at(ReadErrorKind::InvalidNumber, start)),
        }
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            if digits(&mut pos) == 0 {
                return Err(self.error_at(ReadErrorKind::InvalidNumber, start));
            }
        }
        if let Some(b'e' | b'E') = bytes.get(pos) {
            pos += 1;
            if let Some(b'+' | b'-') = bytes.get(pos) {
                pos += 1;
            }
            if digits(&mut pos) == 0 {
                return Err(self.error_at(ReadErrorKind::InvalidNumber, start));
            }
        }
        self.pos = pos;
        Ok(&self.input[start..pos])
    }

    fn scan_string(&mut self) -> Result<Cow<'input, str>, ReadError> {
        // Opening quote.
        self.pos += 1;
        let start = self.pos;
        let bytes = self.input.as_bytes();

        let mut pos = start;
        loop {
            match bytes.get(pos) {
                None => {
                    self.pos = pos;
                    return Err(self.error(ReadErrorKind::UnexpectedEof("in string")));
                }
                Some(b'"') => {
                    self.pos = pos + 1;
                    return Ok(Cow::Borrowed(&self.input[start..pos]));
                }
                Some(b'\\') => break,
                Some(&b) if b < 0x20 => {
                    return Err(self.error_at(ReadErrorKind::ControlCharacter, pos));
                }
                Some(_) => pos += 1,
            }
        }

        let mut decoded = String::from(&self.input[start..pos]);
        loop {
            match bytes.get(pos) {
                None => {
                    self.pos = pos;
                    return Err(self.error(ReadErrorKind::UnexpectedEof("in string")));
                }
                Some(b'"') => {
                    self.pos = pos + 1;
                    return Ok(Cow::Owned(decoded));
                }
                Some(b'\\') => {
                    let escape_start = pos;
                    pos += 1;
                    let c = match bytes.get(pos) {
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(b'/') => '/',
                        Some(b'b') => '\x08',
                        Some(b'f') => '\x0c',
                        Some(b'n') => '\n',
                        Some(b'r') => '\r',
                        Some(b't') => '\t',
                        Some(b'u') => {
                            let (c, next) = self.scan_unicode_escape(pos + 1, escape_start)?;
                            decoded.push(c);
                            pos = next;
                            continue;
                        }
                        _ => return Err(self.error_at(ReadErrorKind::InvalidEscape, escape_start)),
                    };
                    decoded.push(c);
                    pos += 1;
                }
                Some(&b) if b < 0x20 => {
                    return Err(self.error_at(ReadErrorKind::ControlCharacter, pos));
                }
                Some(_) => {
                    // Copy the run up to the next quote or backslash.
                    let run_end = bytes[pos..]
                        .iter()
                        .position(|&b| b == b'"' || b == b'\\' || b < 0x20)
                        .map_or(bytes.len(), |i| pos + i);
                    decoded.push_str(&self.input[pos..run_end]);
                    pos = run_end;
                }
            }
        }
    }

    /// Decodes `XXXX` (and a following `\uXXXX` low surrogate) starting at `pos`.
    fn scan_unicode_escape(&self, pos: usize, escape_start: usize) -> Result<(char, usize), ReadError> {
        let invalid = || self.error_at(ReadErrorKind::InvalidEscape, escape_start);
        let hex = |at: usize| {
            self.input
                .get(at..at + 4)
                .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|digits| u16::from_str_radix(digits, 16).ok())
        };

        let unit = hex(pos).ok_or_else(invalid)?;
        let mut next = pos + 4;
        let code_point = match unit {
            0xD800..=0xDBFF => {
                if self.input.get(next..next + 2) != Some("\\u") {
                    return Err(invalid());
                }
                let low = hex(next + 2).ok_or_else(invalid)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(invalid());
                }
                next += 6;
                0x10000 + ((u32::from(unit) & 0x3FF) << 10) + (u32::from(low) & 0x3FF)
            }
            0xDC00..=0xDFFF => return Err(invalid()),
            _ => u32::from(unit),
        };
        let c = char::from_u32(code_point).ok_or_else(invalid)?;
        Ok((c, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut reader = JsonReader::new(input);
        let mut out = Vec::new();
        loop {
            let token = reader.next_token().unwrap();
            let done = token == Token::EndDocument;
            out.push(token);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn reads_nested_document() {
        let out = tokens(r#" {"a": [1, -2.5e3, true], "b": {"c": null}} "#);
        assert_eq!(
            out,
            vec![
                Token::BeginObject,
                Token::Name("a".into()),
                Token::BeginArray,
                Token::Number("1"),
                Token::Number("-2.5e3"),
                Token::Bool(true),
                Token::EndArray,
                Token::Name("b".into()),
                Token::BeginObject,
                Token::Name("c".into()),
                Token::Null,
                Token::EndObject,
                Token::EndObject,
                Token::EndDocument,
            ]
        );
    }

    #[test]
    fn decodes_escapes() {
        let out = tokens(r#"["plain", "tab\there", "\u00e9\ud83d\ude00", "a\/b"]"#);
        assert_eq!(out[1], Token::String(Cow::Borrowed("plain")));
        assert_eq!(out[2], Token::String("tab\there".into()));
        assert_eq!(out[3], Token::String("é😀".into()));
        assert_eq!(out[4], Token::String("a/b".into()));
    }

    #[test]
    fn path_tracks_names_and_indices() {
        let mut reader = JsonReader::new(r#"{"tags": ["x", "y", "z"]}"#);
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "tags");
        reader.begin_array().unwrap();
        assert_eq!(reader.path(), "$.tags");
        reader.next_token().unwrap();
        assert_eq!(reader.path(), "$.tags[0]");
        reader.next_token().unwrap();
        assert_eq!(reader.peek().unwrap(), TokenKind::String);
        assert_eq!(reader.path(), "$.tags[2]");
    }

    #[test]
    fn skip_value_skips_whole_subtree() {
        let mut reader = JsonReader::new(r#"{"skip": {"a": [1, {"b": 2}]}, "keep": 3}"#);
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.next_name().unwrap(), "keep");
        assert_eq!(reader.next_token().unwrap(), Token::Number("3"));
        reader.end_object().unwrap();
        assert_eq!(reader.peek().unwrap(), TokenKind::EndDocument);
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        let mut reader = JsonReader::new("{\n  \"a\": tru\n}");
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        let err = reader.next_token().unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::UnexpectedChar('t'));
        assert_eq!((err.line, err.column), (2, 8));
        assert_eq!(err.path, "$.a");
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["01", "1.", "-", "[1,]", "{\"a\" 1}", "\"\\x\"", "[1] 2", "\"a\nb\""] {
            let mut reader = JsonReader::new(input);
            let result = (|| -> Result<(), ReadError> {
                loop {
                    if reader.next_token()? == Token::EndDocument {
                        return Ok(());
                    }
                }
            })();
            assert!(result.is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn typed_helpers_check_kinds() {
        let mut reader = JsonReader::new("[]");
        let err = reader.begin_object().unwrap_err();
        assert_eq!(
            err.kind,
            ReadErrorKind::UnexpectedToken {
                expected: "BEGIN_OBJECT",
                found: TokenKind::BeginArray
            }
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let mut reader = JsonReader::new("[[[1]]]").with_max_depth(2);
        assert_eq!(reader.next_token().unwrap(), Token::BeginArray);
        assert_eq!(reader.next_token().unwrap(), Token::BeginArray);
        let err = reader.next_token().unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::DepthLimitExceeded(2));
        assert_eq!(err.column, 3);

        let deep = "[".repeat(DEFAULT_MAX_DEPTH + 1);
        let err = JsonReader::new(&deep).skip_value().unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::DepthLimitExceeded(DEFAULT_MAX_DEPTH));
    }
}
