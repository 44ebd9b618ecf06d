//! Decode saved response bodies offline

use super::CliError;
use crate::decoder::{DEFAULT_CHUNK_SIZE, ResultStream, decode_buffered};

/// Options for the decode command
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Response body
    pub input: Option<String>,
    /// Use the streaming decoder instead of parsing the whole body
    pub stream: bool,
    /// Read size of the streaming decoder
    pub chunk_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            input: None,
            stream: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Execute a snow decode operation, returning the records as a JSON array
pub fn execute_decode(options: &DecodeOptions) -> Result<serde_json::Value, CliError> {
    let body = options.input.as_ref().ok_or(CliError::NoInput)?;

    let records = if options.stream {
        ResultStream::new(body.as_bytes(), options.chunk_size).collect::<crate::Result<Vec<_>>>()?
    } else {
        decode_buffered(body.as_bytes())?
    };

    Ok(serde_json::Value::Array(records))
}
