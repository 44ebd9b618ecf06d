mod common;

use common::{MockTransport, Reply, client};
use serde_json::json;
use snow_client::Error;
use snow_client::cli::{
    BuildOptions, CliError, DecodeOptions, GetCommand, execute_build, execute_decode, execute_get,
};
use snow_client::params::{SYSPARM_FIELDS, SYSPARM_QUERY};

// ============================================================================
// build
// ============================================================================

#[test]
fn test_build_joins_terms_in_order() {
    let options = BuildOptions {
        pairs: vec!["priority=1".into(), "active=true".into()],
        order_by: Vec::new(),
    };
    assert_eq!(execute_build(&options).unwrap(), "priority=1^active=true");
}

#[test]
fn test_build_rejects_bad_term() {
    let options = BuildOptions {
        pairs: vec!["priority".into()],
        ..BuildOptions::default()
    };
    let err = execute_build(&options).unwrap_err();
    assert!(err.to_string().contains("'priority'"));
}

// ============================================================================
// decode
// ============================================================================

#[test]
fn test_decode_error_payload() {
    let options = DecodeOptions {
        input: Some(r#"{"error": {"message": "denied"}}"#.to_string()),
        stream: true,
        ..DecodeOptions::default()
    };
    assert!(matches!(
        execute_decode(&options),
        Err(CliError::Client(Error::ResponseError { .. }))
    ));
}

#[test]
fn test_decode_invalid_json_buffered() {
    let options = DecodeOptions {
        input: Some("nope".to_string()),
        ..DecodeOptions::default()
    };
    assert!(matches!(
        execute_decode(&options),
        Err(CliError::Client(Error::Serialize(_)))
    ));
}

// ============================================================================
// get
// ============================================================================

#[test]
fn test_get_collects_all_records() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"number": "INC1"}, {"number": "INC2"}]}),
    )]);
    let command = GetCommand {
        table: "incident".to_string(),
        query: Some("active=true".to_string()),
        fields: vec!["number".to_string()],
        ..GetCommand::default()
    };

    let output = execute_get(&client(&transport), &command).unwrap();
    assert_eq!(output, json!([{"number": "INC1"}, {"number": "INC2"}]));

    let request = transport.request(0);
    assert!(request.url.ends_with("/api/now/table/incident"));
    assert_eq!(request.param(SYSPARM_QUERY), Some("active=true"));
    assert_eq!(request.param(SYSPARM_FIELDS), Some("number"));
}

#[test]
fn test_get_one_and_first() {
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"n": 1}]})),
        Reply::json(200, json!({"result": [{"n": 1}, {"n": 2}]})),
        Reply::json(200, json!({"result": [{"n": 1}, {"n": 2}]})),
    ]);
    let client = client(&transport);

    let one = GetCommand {
        table: "incident".to_string(),
        one: true,
        ..GetCommand::default()
    };
    assert_eq!(execute_get(&client, &one).unwrap(), json!({"n": 1}));
    assert!(matches!(
        execute_get(&client, &one),
        Err(CliError::Client(Error::MultipleResults(_)))
    ));

    let first = GetCommand {
        table: "incident".to_string(),
        first: true,
        ..GetCommand::default()
    };
    assert_eq!(execute_get(&client, &first).unwrap(), json!({"n": 1}));
}

#[test]
fn test_get_invalid_table_name() {
    let transport = MockTransport::new(vec![]);
    let command = GetCommand {
        table: "bad/".to_string(),
        ..GetCommand::default()
    };
    assert!(matches!(
        execute_get(&client(&transport), &command),
        Err(CliError::Client(Error::InvalidUsage(_)))
    ));
}
