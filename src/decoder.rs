//! # Response body decoding
//!
//! Response bodies carry either a `result` (array or single object) or an
//! `error` object at their root. [`ResultStream`] finds whichever appears
//! first and yields records one at a time straight off the byte stream;
//! [`decode_buffered`] does the same over a fully parsed document.
//!
//! - **[events]** - incremental JSON tokenizer
//! - **[builder]** - assembles values from tokenizer events

pub mod builder;
pub mod events;

use std::io::Read;

use serde_json::Value;
use tracing::{debug, trace};

pub use builder::ValueBuilder;
pub use events::{Event, EventReader};

use crate::error::{Error, Result};

/// Default read size for streamed bodies, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    NoMatch,
    MatchedError,
    MatchedSingle,
    MatchedMany,
    Finished,
}

/// Lazily yields the records of one response body.
///
/// The stream is forward-only. After an error or the end of `result` it
/// yields nothing more.
///
/// ```
/// use serde_json::json;
/// use snow_client::decoder::ResultStream;
///
/// let body = r#"{"result": [{"a": 1}, {"a": 2}]}"#;
/// let mut stream = ResultStream::new(body.as_bytes(), 4);
/// let records = stream.by_ref().collect::<snow_client::Result<Vec<_>>>().unwrap();
/// assert_eq!(records, vec![json!({"a": 1}), json!({"a": 2})]);
/// assert_eq!(ResultStream::count(&stream), 2);
/// ```
pub struct ResultStream<R: Read> {
    reader: EventReader<R>,
    state: StreamState,
    count: usize,
}

impl<R: Read> ResultStream<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        ResultStream {
            reader: EventReader::with_capacity(chunk_size, reader),
            state: StreamState::NoMatch,
            count: 0,
        }
    }

    /// Records decoded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn advance(&mut self) -> Result<Option<Value>> {
        loop {
            match self.state {
                StreamState::Finished => return Ok(None),
                StreamState::NoMatch => self.match_root()?,
                StreamState::MatchedError => {
                    let payload = build_value(&mut self.reader, Event::StartMap)?;
                    self.state = StreamState::Finished;
                    return Err(Error::from_error_payload(&payload));
                }
                StreamState::MatchedSingle => {
                    let record = build_value(&mut self.reader, Event::StartMap)?;
                    self.state = StreamState::Finished;
                    self.count += 1;
                    return Ok(Some(record));
                }
                StreamState::MatchedMany => {
                    let event = next_required(&mut self.reader)?;
                    if event == Event::EndArray {
                        debug!(count = self.count, "end of result array");
                        self.state = StreamState::Finished;
                        return Ok(None);
                    }
                    let record = build_value(&mut self.reader, event)?;
                    self.count += 1;
                    trace!(count = self.count, "decoded record");
                    return Ok(Some(record));
                }
            }
        }
    }

    /// Reads until a root `result` or `error` key opens, skipping everything else.
    fn match_root(&mut self) -> Result<()> {
        loop {
            let Some(event) = self.reader.next_event()? else {
                return Err(Error::MissingResult);
            };

            match event {
                Event::MapKey(key) if self.reader.depth() == 1 => {
                    let value = next_required(&mut self.reader)?;
                    let matched = match (key.as_str(), &value) {
                        ("result", Event::StartArray) => Some(StreamState::MatchedMany),
                        ("result", Event::StartMap) => Some(StreamState::MatchedSingle),
                        ("error", Event::StartMap) => Some(StreamState::MatchedError),
                        _ => None,
                    };
                    match matched {
                        Some(state) => {
                            debug!(key = %key, ?state, "matched response shape");
                            self.state = state;
                            return Ok(());
                        }
                        None => self.skip(&value)?,
                    }
                }
                Event::StartMap if self.reader.depth() == 1 => {}
                Event::StartMap | Event::StartArray => self.skip(&event)?,
                _ => {}
            }
        }
    }

    /// Skips the rest of a value whose first event was `opened`.
    fn skip(&mut self, opened: &Event) -> Result<()> {
        if !matches!(opened, Event::StartMap | Event::StartArray) {
            return Ok(());
        }
        let target = self.reader.depth().saturating_sub(1);
        while self.reader.depth() > target {
            next_required(&mut self.reader)?;
        }
        Ok(())
    }
}

impl<R: Read> Iterator for ResultStream<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.state = StreamState::Finished;
                Some(Err(e))
            }
        }
    }
}

fn next_required<R: Read>(reader: &mut EventReader<R>) -> Result<Event> {
    match reader.next_event()? {
        Some(event) => Ok(event),
        None => Err(Error::Json {
            offset: reader.offset(),
            message: "unexpected end of input".to_string(),
        }),
    }
}

/// Builds one value starting from its already-read first event.
fn build_value<R: Read>(reader: &mut EventReader<R>, first: Event) -> Result<Value> {
    let mut builder = ValueBuilder::new();
    builder.event(first);
    while !builder.is_complete() {
        builder.event(next_required(reader)?);
    }
    Ok(builder.finish().unwrap_or_default())
}

/// Parses a whole body, then extracts its records the same way
/// [`ResultStream`] does.
pub fn decode_buffered<R: Read>(reader: R) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_reader(reader)?;
    records_from_document(document)
}

/// Extracts records from a parsed body. The first root `result` or `error`
/// key decides the outcome.
pub fn records_from_document(document: Value) -> Result<Vec<Value>> {
    let Value::Object(root) = document else {
        return Err(Error::MissingResult);
    };

    for (key, value) in root {
        match (key.as_str(), value) {
            ("result", Value::Array(items)) => return Ok(items),
            ("result", record @ Value::Object(_)) => return Ok(vec![record]),
            ("error", payload @ Value::Object(_)) => {
                return Err(Error::from_error_payload(&payload));
            }
            _ => {}
        }
    }

    Err(Error::MissingResult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream(body: &str) -> ResultStream<&[u8]> {
        ResultStream::new(body.as_bytes(), 2)
    }

    #[test]
    fn skips_unrelated_root_keys() {
        let records: Vec<_> = stream(r#"{"meta": {"x": [1, 2]}, "result": [{"a": 1}]}"#)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records, vec![json!({"a": 1})]);
    }

    #[test]
    fn stops_after_result_closes() {
        let mut s = stream(r#"{"result": [], "garbage": ]"#);
        assert!(s.next().is_none());
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn error_payload_after_other_keys() {
        let mut s = stream(r#"{"status": "failure", "error": {"message": "m"}}"#);
        match s.next() {
            Some(Err(Error::ResponseError { message, detail })) => {
                assert_eq!(message, "m");
                assert_eq!(detail, "<empty>");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(s.next().is_none());
    }

    #[test]
    fn buffered_matches_streamed_shape() {
        let body = r#"{"result": {"sys_id": "abc"}}"#;
        let buffered = decode_buffered(body.as_bytes()).unwrap();
        let streamed: Vec<_> = stream(body).collect::<Result<_>>().unwrap();
        assert_eq!(buffered, streamed);
        assert!(matches!(decode_buffered("{}".as_bytes()), Err(Error::MissingResult)));
    }
}
