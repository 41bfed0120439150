use std::fmt;

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralErrorKind {
    UnexpectedEnd,
    UnexpectedChar(char),
    UnterminatedString,
    UnsupportedEscape(String),
    InvalidNumber(String),
    UnknownName(String),
    UnhashableKey,
    TrailingInput,
    TooDeep,
}

impl fmt::Display for LiteralErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::UnexpectedChar(ch) => write!(f, "unexpected character {ch:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnsupportedEscape(escape) => write!(f, "unsupported escape \\{escape}"),
            Self::InvalidNumber(text) => write!(f, "invalid number literal {text:?}"),
            Self::UnknownName(name) => write!(f, "name {name:?} is not a literal"),
            Self::UnhashableKey => write!(f, "mapping key must be a string, number, boolean or null"),
            Self::TrailingInput => write!(f, "unexpected input after literal"),
            Self::TooDeep => write!(f, "literal nests deeper than {MAX_DEPTH} levels"),
        }
    }
}

const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Seq(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
}

/// Parses a literal expression (Python-style or JSON-style) into a JSON value.
///
/// Sets and tuples come back as arrays, so only `{key: value}` forms yield objects.
pub fn parse_literal(source: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        depth: 0,
    };
    let literal = parser.parse_value()?;
    parser.skip_trivia();
    if parser.pos < source.len() {
        return Err(parser.error(LiteralErrorKind::TrailingInput));
    }

    to_json(literal).map_err(|kind| LiteralError { offset: 0, kind })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError {
            offset: self.pos,
            kind,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\n' | '\r' | '\x0c' => {
                    self.bump();
                }
                '\\' if matches!(self.peek_nth(1), Some('\n' | '\r')) => {
                    self.bump();
                }
                '#' => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(ch) => self.error(LiteralErrorKind::UnexpectedChar(ch)),
            None => self.error(LiteralErrorKind::UnexpectedEnd),
        }
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error(LiteralErrorKind::UnexpectedEnd)),
            Some('{') => self.nested(Self::parse_braced),
            Some('[') => self.nested(Self::parse_list),
            Some('(') => self.nested(Self::parse_parenthesized),
            Some('\'' | '"') => self.parse_strings(false),
            Some('-' | '+') => self.parse_signed(),
            Some(ch) if ch.is_ascii_digit() => self.parse_number(false),
            Some('.') if self.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit()) => {
                self.parse_number(false)
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_name(),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Literal, LiteralError>,
    ) -> Result<Literal, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(LiteralErrorKind::TooDeep));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Literal, LiteralError> {
        let mut negative = false;
        while let Some(sign @ ('-' | '+')) = self.peek() {
            self.bump();
            negative ^= sign == '-';
            self.skip_trivia();
        }
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.parse_number(negative),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_list(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        let items = self.parse_sequence_tail(']')?;
        Ok(Literal::Seq(items))
    }

    fn parse_parenthesized(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_trivia();
        if self.eat(')') {
            return Ok(Literal::Seq(Vec::new()));
        }

        let first = self.parse_value()?;
        self.skip_trivia();
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.unexpected());
        }

        let mut items = vec![first];
        items.extend(self.parse_sequence_tail(')')?);
        Ok(Literal::Seq(items))
    }

    /// Parses `item, item, ... close` with an optional trailing comma, the
    /// opening delimiter (or leading `item,`) already consumed.
    fn parse_sequence_tail(&mut self, close: char) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            if !self.eat(',') {
                return Err(self.unexpected());
            }
        }
    }

    fn parse_braced(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_trivia();
        if self.eat('}') {
            return Ok(Literal::Map(Vec::new()));
        }

        let first = self.parse_value()?;
        self.skip_trivia();
        if !self.eat(':') {
            // `{a, b}` is a set literal.
            if self.eat('}') {
                return Ok(Literal::Seq(vec![first]));
            }
            if !self.eat(',') {
                return Err(self.unexpected());
            }
            let mut items = vec![first];
            items.extend(self.parse_sequence_tail('}')?);
            return Ok(Literal::Seq(items));
        }

        let mut entries = vec![(first, self.parse_value()?)];
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Literal::Map(entries));
            }
            if !self.eat(',') {
                return Err(self.unexpected());
            }
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Literal::Map(entries));
            }
            let key = self.parse_value()?;
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.unexpected());
            }
            let value = self.parse_value()?;
            entries.push((key, value));
        }
    }

    fn parse_name(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        let name = &self.src[start..self.pos];

        if matches!(self.peek(), Some('\'' | '"')) && is_string_prefix(name) {
            let raw = name.chars().any(|ch| ch.eq_ignore_ascii_case(&'r'));
            return self.parse_strings(raw);
        }

        match name {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::Null),
            other => Err(LiteralError {
                offset: start,
                kind: LiteralErrorKind::UnknownName(other.to_string()),
            }),
        }
    }

    /// Parses one string literal plus any adjacent ones, which concatenate.
    fn parse_strings(&mut self, raw: bool) -> Result<Literal, LiteralError> {
        let mut text = self.parse_string_body(raw)?;
        loop {
            let checkpoint = self.pos;
            self.skip_trivia();
            match self.peek() {
                Some('\'' | '"') => text.push_str(&self.parse_string_body(false)?),
                Some(ch) if ch.is_alphabetic() => {
                    let start = self.pos;
                    while self.peek().is_some_and(|ch| ch.is_ascii_alphabetic()) {
                        self.bump();
                    }
                    let prefix = &self.src[start..self.pos];
                    if is_string_prefix(prefix) && matches!(self.peek(), Some('\'' | '"')) {
                        let raw = prefix.chars().any(|ch| ch.eq_ignore_ascii_case(&'r'));
                        text.push_str(&self.parse_string_body(raw)?);
                    } else {
                        self.pos = checkpoint;
                        return Ok(Literal::Str(text));
                    }
                }
                _ => {
                    self.pos = checkpoint;
                    return Ok(Literal::Str(text));
                }
            }
        }
    }

    fn parse_string_body(&mut self, raw: bool) -> Result<String, LiteralError> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| self.error(LiteralErrorKind::UnexpectedEnd))?;
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let unterminated = LiteralError {
            offset: start,
            kind: LiteralErrorKind::UnterminatedString,
        };
        let mut out = String::new();
        loop {
            let ch = self.bump().ok_or_else(|| unterminated.clone())?;
            match ch {
                c if c == quote => {
                    if !triple {
                        return Ok(out);
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        return Ok(out);
                    }
                    out.push(c);
                }
                '\n' if !triple => return Err(unterminated),
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.parse_escape(&mut out)?,
                other => out.push(other),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let escape_start = self.pos;
        let ch = self
            .bump()
            .ok_or_else(|| self.error(LiteralErrorKind::UnterminatedString))?;
        match ch {
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            'x' => out.push(self.parse_hex_escape(2, escape_start)?),
            'u' => out.push(self.parse_hex_escape(4, escape_start)?),
            'U' => out.push(self.parse_hex_escape(8, escape_start)?),
            '0'..='7' => {
                let mut value = ch.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|next| next.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or_else(|| LiteralError {
                    offset: escape_start,
                    kind: LiteralErrorKind::UnsupportedEscape(format!("{value:o}")),
                })?);
            }
            'N' => {
                return Err(LiteralError {
                    offset: escape_start,
                    kind: LiteralErrorKind::UnsupportedEscape("N{...}".to_string()),
                });
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, digits: usize, escape_start: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let text = self.src.get(self.pos..end).unwrap_or("");
        let invalid = || LiteralError {
            offset: escape_start,
            kind: LiteralErrorKind::UnsupportedEscape(text.to_string()),
        };
        if text.len() != digits || !text.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(text, 16).map_err(|_| invalid())?;
        let ch = char::from_u32(value).ok_or_else(invalid)?;
        self.pos = end;
        Ok(ch)
    }

    fn parse_number(&mut self, negative: bool) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
        {
            let ch = self.bump();
            if matches!(ch, Some('e' | 'E'))
                && !self.src[start..self.pos].starts_with("0x")
                && !self.src[start..self.pos].starts_with("0X")
                && matches!(self.peek(), Some('+' | '-'))
            {
                self.bump();
            }
        }

        let text = &self.src[start..self.pos];
        let invalid = || LiteralError {
            offset: start,
            kind: LiteralErrorKind::InvalidNumber(text.to_string()),
        };
        if text.starts_with('_') || text.ends_with('_') || text.contains("__") {
            return Err(invalid());
        }
        let cleaned: String = text.chars().filter(|ch| *ch != '_').collect();
        let literal = parse_number_text(&cleaned).ok_or_else(invalid)?;

        Ok(negate_if(literal, negative))
    }
}

fn parse_number_text(text: &str) -> Option<Literal> {
    let lower = text.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            if digits.is_empty() {
                return None;
            }
            return i128::from_str_radix(digits, radix).ok().map(Literal::Int);
        }
    }

    if lower.chars().all(|ch| ch.is_ascii_digit()) {
        if lower.len() > 1 && lower.starts_with('0') && lower.chars().any(|ch| ch != '0') {
            return None;
        }
        return match lower.parse::<i128>() {
            Ok(value) => Some(Literal::Int(value)),
            Err(_) => lower.parse::<f64>().ok().map(Literal::Float),
        };
    }

    let valid_float = lower
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | '+' | '-'));
    if !valid_float {
        return None;
    }
    lower
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Literal::Float)
}

fn negate_if(literal: Literal, negative: bool) -> Literal {
    if !negative {
        return literal;
    }
    match literal {
        Literal::Int(value) => Literal::Int(-value),
        Literal::Float(value) => Literal::Float(-value),
        other => other,
    }
}

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "rb" | "br"
    )
}

fn to_json(literal: Literal) -> Result<Value, LiteralErrorKind> {
    Ok(match literal {
        Literal::Null => Value::Null,
        Literal::Bool(value) => Value::Bool(value),
        Literal::Int(value) => int_to_json(value),
        Literal::Float(value) => float_to_json(value)?,
        Literal::Str(value) => Value::String(value),
        Literal::Seq(items) => Value::Array(
            items
                .into_iter()
                .map(to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Literal::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key_to_string(key)?, to_json(value)?);
            }
            Value::Object(map)
        }
    })
}

fn int_to_json(value: i128) -> Value {
    if let Ok(small) = i64::try_from(value) {
        Value::from(small)
    } else if let Ok(unsigned) = u64::try_from(value) {
        Value::from(unsigned)
    } else {
        Number::from_f64(value as f64).map_or(Value::Null, Value::Number)
    }
}

fn float_to_json(value: f64) -> Result<Value, LiteralErrorKind> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| LiteralErrorKind::InvalidNumber(value.to_string()))
}

fn key_to_string(key: Literal) -> Result<String, LiteralErrorKind> {
    match key {
        Literal::Str(value) => Ok(value),
        Literal::Null => Ok("null".to_string()),
        Literal::Bool(value) => Ok(value.to_string()),
        Literal::Int(value) => Ok(value.to_string()),
        Literal::Float(value) => Ok(float_to_json(value)?.to_string()),
        Literal::Seq(_) | Literal::Map(_) => Err(LiteralErrorKind::UnhashableKey),
    }
}
