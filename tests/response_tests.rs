mod common;

use common::{BASE, MockTransport, Reply, client, client_with};
use serde_json::{Value, json};
use snow_client::{Error, GetOptions, Method};

fn incident_url() -> String {
    format!("{BASE}/api/now/table/incident")
}

// ============================================================================
// Record access
// ============================================================================

#[test]
fn test_all_collects_records() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"sys_id": "1"}, {"sys_id": "2"}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("active=true", GetOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.method(), Method::Get);
    assert!(!response.is_stream());

    let records = response.all().collect::<snow_client::Result<Vec<_>>>().unwrap();
    assert_eq!(records, vec![json!({"sys_id": "1"}), json!({"sys_id": "2"})]);
    assert_eq!(response.count(), 2);
    assert_eq!(format!("{:?}", response), "<Response [200 - GET]>");
}

#[test]
fn test_all_reports_count_while_iterating() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"n": 1}, {"n": 2}, {"n": 3}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();
    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();

    let mut records = response.all();
    records.next();
    assert_eq!(snow_client::Records::count(&records), 1);
}

#[test]
fn test_first_requires_stream() {
    let transport = MockTransport::new(vec![Reply::json(200, json!({"result": [{"a": 1}]}))]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.first(), Err(Error::InvalidUsage(_))));
    assert!(matches!(response.first_or_none(), Err(Error::InvalidUsage(_))));
}

#[test]
fn test_first_on_stream() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"a": 1}, {"a": 2}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.first().unwrap(), json!({"a": 1}));
}

#[test]
fn test_first_or_none_on_empty_stream() {
    let transport = MockTransport::new(vec![Reply::json(200, json!({"result": []}))]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.first_or_none().unwrap(), None);
}

#[test]
fn test_one_and_its_cache() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"sys_id": "abc", "number": "INC1"}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("number=INC1", GetOptions::default()).unwrap();
    assert_eq!(response.one().unwrap()["sys_id"], "abc");
    assert_eq!(response.one().unwrap()["number"], "INC1");
    assert_eq!(response.get("number").unwrap(), Some(json!("INC1")));
    assert_eq!(response.get("missing").unwrap(), None);
}

#[test]
fn test_one_with_multiple_records() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"a": 1}, {"a": 2}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.one(), Err(Error::MultipleResults(_))));
}

#[test]
fn test_one_remembers_multiple_results() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"result": [{"a": 1}, {"a": 2}, {"a": 3}]}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.one(), Err(Error::MultipleResults(_))));
    assert!(matches!(response.one(), Err(Error::MultipleResults(_))));
    assert!(matches!(response.one_or_none(), Err(Error::MultipleResults(_))));
}

#[test]
fn test_one_counts_records_already_read() {
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"a": 1}, {"a": 2}]})),
        Reply::json(200, json!({"result": [{"a": 1}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.all().next().unwrap().unwrap(), json!({"a": 1}));
    assert!(matches!(response.one(), Err(Error::MultipleResults(_))));

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.first().unwrap(), json!({"a": 1}));
    assert_eq!(response.one().unwrap(), json!({"a": 1}));
}

#[test]
fn test_first_after_one() {
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"a": 1}]})),
        Reply::json(200, json!({"result": [{"a": 1}, {"a": 2}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.one().unwrap(), json!({"a": 1}));
    assert_eq!(response.first().unwrap(), json!({"a": 1}));
    assert_eq!(response.first_or_none().unwrap(), Some(json!({"a": 1})));

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert!(response.one().is_err());
    assert_eq!(response.first().unwrap(), json!({"a": 1}));
}

#[test]
fn test_one_or_none() {
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": []})),
        Reply::json(200, json!({"result": [{"a": 1}, {"a": 2}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut empty = resource.get("", GetOptions::default()).unwrap();
    assert_eq!(empty.one_or_none().unwrap(), None);

    let mut many = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(many.one_or_none(), Err(Error::MultipleResults(_))));
}

// ============================================================================
// Empty results
// ============================================================================

#[test]
fn test_empty_result_raises_by_default() {
    let transport = MockTransport::new(vec![Reply::json(200, json!({"result": []}))]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.one(), Err(Error::NoResults(_))));
}

#[test]
fn test_empty_result_without_raise() {
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": []})),
        Reply::json(200, json!({"result": []})),
    ]);
    let resource = client_with(&transport, false).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert_eq!(response.one().unwrap(), json!({}));

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.first().unwrap(), json!({}));
}

#[test]
fn test_get_not_found_is_empty() {
    let transport = MockTransport::new(vec![
        Reply::json(404, json!({"error": {"message": "No Record found"}})),
        Reply::raw(404, ""),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.all().next().is_none());

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert!(matches!(response.one(), Err(Error::NoResults(_))));
}

// ============================================================================
// Status handling
// ============================================================================

#[test]
fn test_get_accepted_without_content() {
    let transport = MockTransport::new(vec![Reply::raw(202, "")]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    assert!(matches!(
        resource.get("", GetOptions::default()),
        Err(Error::EmptyContent(_))
    ));
}

#[test]
fn test_get_accepted_with_records() {
    let transport = MockTransport::new(vec![
        Reply::json(202, json!({"result": [{"a": 1}]})),
        Reply::raw(202, "  \n"),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.status(), 202);
    assert_eq!(response.one().unwrap(), json!({"a": 1}));

    assert!(matches!(
        resource.get("", GetOptions::default()),
        Err(Error::EmptyContent(_))
    ));
}

#[test]
fn test_delete_no_content_yields_status_record() {
    let transport = MockTransport::new(vec![
        Reply::raw(204, ""),
        Reply::raw(204, "{not json"),
        Reply::json(204, json!({"result": [{"a": 1}, {"a": 2}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.delete_record("abc").unwrap();
    assert_eq!(response.method(), Method::Delete);
    assert_eq!(response.one().unwrap(), json!({"status": "record deleted"}));

    for _ in 0..2 {
        let mut response = resource.delete_record("abc").unwrap();
        assert_eq!(response.one().unwrap(), json!({"status": "record deleted"}));
    }
}

#[test]
fn test_unhandled_status() {
    let transport = MockTransport::new(vec![Reply::json(
        500,
        json!({"error": {"message": "boom"}}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    match resource.get("", GetOptions::default()) {
        Err(Error::Http { method, url, status }) => {
            assert_eq!(method, "GET");
            assert_eq!(url, incident_url());
            assert_eq!(status, 500);
        }
        other => panic!("expected HTTP error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_error_payload_on_success_status() {
    let transport = MockTransport::new(vec![Reply::json(
        200,
        json!({"error": {"message": "bad query", "detail": "field x"}}),
    )]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    match response.first() {
        Err(Error::ResponseError { message, detail }) => {
            assert_eq!(message, "bad query");
            assert_eq!(detail, "field x");
        }
        other => panic!("expected response error, got {:?}", other),
    }
}

#[test]
fn test_buffered_missing_result() {
    let transport = MockTransport::new(vec![Reply::json(200, json!({"records": []}))]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.one(), Err(Error::MissingResult)));
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_follows_next_links() {
    let page2 = format!("{}?sysparm_offset=2", incident_url());
    let page3 = format!("{}?sysparm_offset=4", incident_url());
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"n": 1}, {"n": 2}]})).with_next(&page2),
        Reply::json(200, json!({"result": [{"n": 3}, {"n": 4}]})).with_next(&page3),
        Reply::json(200, json!({"result": [{"n": 5}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    let numbers: Vec<i64> = response
        .all()
        .map(|r| r.unwrap()["n"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(response.count(), 5);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].url, page2);
    assert_eq!(requests[2].url, page3);
    assert!(requests[1].params.is_empty());
}

#[test]
fn test_pages_are_fetched_lazily() {
    let page2 = format!("{}?sysparm_offset=1", incident_url());
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"n": 1}]})).with_next(&page2),
        Reply::json(200, json!({"result": [{"n": 2}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    assert_eq!(response.first().unwrap(), json!({"n": 1}));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_one_spans_pages() {
    let page2 = format!("{}?sysparm_offset=1", incident_url());
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"n": 1}]})).with_next(&page2),
        Reply::json(200, json!({"result": [{"n": 2}]})),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::default()).unwrap();
    assert!(matches!(response.one(), Err(Error::MultipleResults(_))));
}

#[test]
fn test_failing_next_page() {
    let page2 = format!("{}?sysparm_offset=1", incident_url());
    let transport = MockTransport::new(vec![
        Reply::json(200, json!({"result": [{"n": 1}]})).with_next(&page2),
        Reply::raw(503, ""),
    ]);
    let resource = client(&transport).resource("/table/incident").unwrap();

    let mut response = resource.get("", GetOptions::new().stream(true)).unwrap();
    let results: Vec<snow_client::Result<Value>> = response.all().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Http { status: 503, .. })));
}
