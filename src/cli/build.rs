//! Render encoded queries from the command line

use super::CliError;
use crate::params::{QueryInput, append_order_by};

/// Options for the build command
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// `key=value` terms, joined with `^` in the order given
    pub pairs: Vec<String>,
    /// Sort keys, `-` prefixed for descending
    pub order_by: Vec<String>,
}

/// Split a `key=value` term at its first `=`
pub fn parse_pair(term: &str) -> Result<(String, String), CliError> {
    match term.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidPair(term.to_string())),
    }
}

/// Execute a snow build operation
pub fn execute_build(options: &BuildOptions) -> Result<String, CliError> {
    let pairs = options
        .pairs
        .iter()
        .map(|term| parse_pair(term))
        .collect::<Result<Vec<_>, _>>()?;

    let query = QueryInput::from(pairs).stringify()?;
    Ok(append_order_by(&query, &options.order_by))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_mapping_with_order() {
        let options = BuildOptions {
            pairs: vec!["active=true".into(), "priority=1".into()],
            order_by: vec!["-sys_created_on".into()],
        };
        assert_eq!(
            execute_build(&options).unwrap(),
            "active=true^priority=1^ORDERBYDESCsys_created_on"
        );
    }

    #[test]
    fn value_may_contain_equals() {
        assert_eq!(
            parse_pair("short_description=a=b").unwrap(),
            ("short_description".to_string(), "a=b".to_string())
        );
        assert!(matches!(parse_pair("=x"), Err(CliError::InvalidPair(_))));
        assert!(matches!(parse_pair("novalue"), Err(CliError::InvalidPair(_))));
    }
}
