use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?$")
        .expect("Invalid number regex pattern")
});

/// One step of an incremental JSON parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartMap,
    MapKey(String),
    EndMap,
    StartArray,
    EndArray,
    /// A string, number, boolean or null.
    Scalar(serde_json::Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Value,
    FirstKeyOrEnd,
    Key,
    Colon,
    CommaOrEnd,
    FirstValueOrEnd,
    Done,
}

/// Pull-based JSON tokenizer over a byte stream.
///
/// Reads through a `BufReader` of the configured capacity, so at most one
/// chunk of the body is held in memory beyond the value being produced.
pub struct EventReader<R: Read> {
    reader: BufReader<R>,
    stack: Vec<Frame>,
    expect: Expect,
    offset: usize,
    failed: bool,
}

impl<R: Read> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(8192, reader)
    }

    pub fn with_capacity(chunk_size: usize, reader: R) -> Self {
        EventReader {
            reader: BufReader::with_capacity(chunk_size.max(1), reader),
            stack: Vec::new(),
            expect: Expect::Value,
            offset: 0,
            failed: false,
        }
    }

    /// Number of objects and arrays currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn error(&mut self, message: impl Into<String>) -> Error {
        self.failed = true;
        Error::Json {
            offset: self.offset,
            message: message.into(),
        }
    }

    fn current_byte(&mut self) -> Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        Ok(buf.first().copied())
    }

    fn advance(&mut self) {
        self.reader.consume(1);
        self.offset += 1;
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.current_byte()?;
        if byte.is_some() {
            self.advance();
        }
        Ok(byte)
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.current_byte()? {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) {
        self.expect = if self.stack.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
    }

    fn close(&mut self, frame: Frame) -> Result<Event> {
        match self.stack.pop() {
            Some(open) if open == frame => {}
            _ => return Err(self.error("mismatched closing bracket")),
        }
        self.after_value();
        Ok(match frame {
            Frame::Object => Event::EndMap,
            Frame::Array => Event::EndArray,
        })
    }

    /// Returns the next event, or `None` once a complete document was read.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        if self.failed {
            return Ok(None);
        }

        loop {
            self.skip_whitespace()?;
            match self.expect {
                Expect::Done => {
                    return match self.current_byte()? {
                        None => Ok(None),
                        Some(b) => Err(self.error(format!(
                            "trailing characters after document: '{}'",
                            b as char
                        ))),
                    };
                }
                Expect::Value => return self.read_value().map(Some),
                Expect::FirstValueOrEnd => {
                    if self.current_byte()? == Some(b']') {
                        self.advance();
                        return self.close(Frame::Array).map(Some);
                    }
                    return self.read_value().map(Some);
                }
                Expect::FirstKeyOrEnd => {
                    if self.current_byte()? == Some(b'}') {
                        self.advance();
                        return self.close(Frame::Object).map(Some);
                    }
                    return self.read_key().map(Some);
                }
                Expect::Key => return self.read_key().map(Some),
                Expect::Colon => match self.next_byte()? {
                    Some(b':') => self.expect = Expect::Value,
                    _ => return Err(self.error("expected ':' after object key")),
                },
                Expect::CommaOrEnd => {
                    let top = self.stack.last().copied();
                    match (self.next_byte()?, top) {
                        (Some(b','), Some(Frame::Object)) => self.expect = Expect::Key,
                        (Some(b','), Some(Frame::Array)) => self.expect = Expect::Value,
                        (Some(b'}'), Some(Frame::Object)) => {
                            return self.close(Frame::Object).map(Some);
                        }
                        (Some(b']'), Some(Frame::Array)) => {
                            return self.close(Frame::Array).map(Some);
                        }
                        (None, _) => return Err(self.error("unexpected end of input")),
                        (Some(b), _) => {
                            return Err(self.error(format!(
                                "expected ',' or closing bracket, found '{}'",
                                b as char
                            )));
                        }
                    }
                }
            }
        }
    }

    fn read_key(&mut self) -> Result<Event> {
        match self.next_byte()? {
            Some(b'"') => {}
            _ => return Err(self.error("expected string key")),
        }
        let key = self.read_string()?;
        self.expect = Expect::Colon;
        Ok(Event::MapKey(key))
    }

    fn read_value(&mut self) -> Result<Event> {
        match self.current_byte()? {
            Some(b'{') => {
                self.advance();
                self.stack.push(Frame::Object);
                self.expect = Expect::FirstKeyOrEnd;
                Ok(Event::StartMap)
            }
            Some(b'[') => {
                self.advance();
                self.stack.push(Frame::Array);
                self.expect = Expect::FirstValueOrEnd;
                Ok(Event::StartArray)
            }
            Some(b'"') => {
                self.advance();
                let s = self.read_string()?;
                self.after_value();
                Ok(Event::Scalar(serde_json::Value::String(s)))
            }
            Some(b't') => self.read_keyword(b"true", serde_json::Value::Bool(true)),
            Some(b'f') => self.read_keyword(b"false", serde_json::Value::Bool(false)),
            Some(b'n') => self.read_keyword(b"null", serde_json::Value::Null),
            Some(b) if b == b'-' || b.is_ascii_digit() => {
                let n = self.read_number()?;
                self.after_value();
                Ok(Event::Scalar(serde_json::Value::Number(n)))
            }
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn read_keyword(&mut self, word: &[u8], value: serde_json::Value) -> Result<Event> {
        for expected in word {
            if self.next_byte()? != Some(*expected) {
                return Err(self.error(format!(
                    "invalid literal, expected '{}'",
                    String::from_utf8_lossy(word)
                )));
            }
        }
        self.after_value();
        Ok(Event::Scalar(value))
    }

    fn read_number(&mut self) -> Result<serde_json::Number> {
        let mut text = String::new();
        while let Some(b) = self.current_byte()? {
            if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E') {
                text.push(b as char);
                self.advance();
            } else {
                break;
            }
        }

        if !NUMBER_PATTERN.is_match(&text) {
            return Err(self.error(format!("invalid number '{text}'")));
        }

        let is_integer = !text.contains(['.', 'e', 'E']);
        if is_integer {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(n.into());
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(n.into());
            }
        }

        match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            Some(n) => Ok(n),
            None => Err(self.error(format!("invalid number '{text}'"))),
        }
    }

    /// Reads up to and including the closing quote. The opening quote is
    /// already consumed.
    fn read_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.next_byte()? {
                Some(b'"') => break,
                Some(b'\\') => match self.next_byte()? {
                    Some(b'"') => bytes.push(b'"'),
                    Some(b'\\') => bytes.push(b'\\'),
                    Some(b'/') => bytes.push(b'/'),
                    Some(b'b') => bytes.push(0x08),
                    Some(b'f') => bytes.push(0x0c),
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b'r') => bytes.push(b'\r'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(b'u') => {
                        let ch = self.read_unicode_escape()?;
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    Some(b) => {
                        return Err(self.error(format!("invalid escape sequence: \\{}", b as char)));
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(b) if b < 0x20 => {
                    return Err(self.error(format!("control character 0x{b:02x} in string")));
                }
                Some(b) => bytes.push(b),
                None => return Err(self.error("unterminated string")),
            }
        }

        String::from_utf8(bytes).map_err(|_| self.error("invalid UTF-8 in string"))
    }

    fn read_hex4(&mut self) -> Result<u16> {
        let mut value = 0u16;
        for _ in 0..4 {
            let digit = match self.next_byte()? {
                Some(b) => (b as char).to_digit(16),
                None => None,
            };
            match digit {
                Some(d) => value = value * 16 + d as u16,
                None => return Err(self.error("invalid \\u escape")),
            }
        }
        Ok(value)
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let first = self.read_hex4()?;
        let code = if (0xD800..0xDC00).contains(&first) {
            if self.next_byte()? != Some(b'\\') || self.next_byte()? != Some(b'u') {
                return Err(self.error("unpaired surrogate in \\u escape"));
            }
            let second = self.read_hex4()?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err(self.error("invalid low surrogate in \\u escape"));
            }
            0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
        } else {
            u32::from(first)
        };

        match char::from_u32(code) {
            Some(ch) => Ok(ch),
            None => Err(self.error("invalid code point in \\u escape")),
        }
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
fn events(input: &str) -> Vec<Event> {
    EventReader::with_capacity(3, input.as_bytes())
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_nested_document() {
    use serde_json::json;
    assert_eq!(
        events(r#"{"result": [{"a": 1}, []], "b": null}"#),
        vec![
            Event::StartMap,
            Event::MapKey("result".to_string()),
            Event::StartArray,
            Event::StartMap,
            Event::MapKey("a".to_string()),
            Event::Scalar(json!(1)),
            Event::EndMap,
            Event::StartArray,
            Event::EndArray,
            Event::EndArray,
            Event::MapKey("b".to_string()),
            Event::Scalar(json!(null)),
            Event::EndMap,
        ]
    );
}

#[test]
fn test_string_escapes() {
    use serde_json::json;
    assert_eq!(
        events(r#"["a\"b\\né😀"]"#),
        vec![
            Event::StartArray,
            Event::Scalar(json!("a\"b\\n\u{e9}\u{1f600}")),
            Event::EndArray,
        ]
    );
    assert_eq!(
        events(r#"["\u00e9\ud83d\ude00\t"]"#),
        vec![
            Event::StartArray,
            Event::Scalar(json!("\u{e9}\u{1f600}\t")),
            Event::EndArray,
        ]
    );
}

#[test]
fn test_numbers() {
    use serde_json::json;
    assert_eq!(
        events("[-12, 18446744073709551615, 1.5e2, true, false]"),
        vec![
            Event::StartArray,
            Event::Scalar(json!(-12)),
            Event::Scalar(json!(18446744073709551615u64)),
            Event::Scalar(json!(150.0)),
            Event::Scalar(json!(true)),
            Event::Scalar(json!(false)),
            Event::EndArray,
        ]
    );
}

#[test]
fn test_depth_tracking() {
    let mut reader = EventReader::new(r#"{"a": [1]}"#.as_bytes());
    assert_eq!(reader.next_event().unwrap(), Some(Event::StartMap));
    assert_eq!(reader.depth(), 1);
    reader.next_event().unwrap();
    assert_eq!(reader.next_event().unwrap(), Some(Event::StartArray));
    assert_eq!(reader.depth(), 2);
}

#[test]
fn test_malformed_input() {
    let result: Result<Vec<_>> = EventReader::new(r#"{"a" 1}"#.as_bytes()).collect();
    assert!(matches!(result, Err(Error::Json { .. })));

    let result: Result<Vec<_>> = EventReader::new(r#"{"a": [1}"#.as_bytes()).collect();
    assert!(result.is_err());

    let result: Result<Vec<_>> = EventReader::new("".as_bytes()).collect();
    assert!(result.is_err());

    for input in ["[01]", "[1.]", "[-]", "[.5]", "[1e]", "[+1]", "[1.5e+]", "[--1]"] {
        let result: Result<Vec<_>> = EventReader::new(input.as_bytes()).collect();
        assert!(matches!(result, Err(Error::Json { .. })), "{input}");
    }

    for input in ["[\"x\ty\"]", "[\"x\ny\"]", "[\"\u{1}\"]"] {
        let result: Result<Vec<_>> = EventReader::new(input.as_bytes()).collect();
        assert!(matches!(result, Err(Error::Json { .. })), "{input:?}");
    }
}
