//! Query a table on a live instance

use super::CliError;
use crate::{Client, GetOptions, QueryInput};

/// Options for the get command
#[derive(Debug, Clone, Default)]
pub struct GetCommand {
    /// Table to query, e.g. `incident`
    pub table: String,
    /// Raw encoded query
    pub query: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub fields: Vec<String>,
    /// Sort keys, `-` prefixed for descending
    pub order_by: Vec<String>,
    /// Decode records off the byte stream
    pub stream: bool,
    /// Expect exactly one record
    pub one: bool,
    /// Return only the first record (implies stream)
    pub first: bool,
}

/// Execute a snow get operation
///
/// Returns a single record for `one`/`first`, otherwise an array of records.
pub fn execute_get(client: &Client, command: &GetCommand) -> Result<serde_json::Value, CliError> {
    let resource = client.resource(&format!("/table/{}", command.table))?;

    let mut options = GetOptions::new()
        .fields(command.fields.iter().cloned())
        .order_by(command.order_by.iter().cloned())
        .stream(command.stream || command.first);
    if let Some(limit) = command.limit {
        options = options.limit(limit);
    }
    if let Some(offset) = command.offset {
        options = options.offset(offset);
    }

    let query = QueryInput::from(command.query.clone().unwrap_or_default());
    let mut response = resource.get(query, options)?;

    if command.one {
        return Ok(response.one()?);
    }
    if command.first {
        return Ok(response.first()?);
    }

    let records = response.all().collect::<crate::Result<Vec<_>>>()?;
    Ok(serde_json::Value::Array(records))
}
