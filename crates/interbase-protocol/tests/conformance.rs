//! Runs the shared cross-SDK wire-format vectors against this
//! implementation. The YAML files under `tests/conformance/` are the
//! same cases the other language SDKs execute.

use interbase_protocol::{ErrorKind, ToolError};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Suite {
    domain: String,
    tests: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    kind: String,
    message: String,
    #[serde(default)]
    recoverable: Option<bool>,
    #[serde(default)]
    data: BTreeMap<String, Value>,
    expect_wire: String,
    #[serde(default)]
    expect_display: Option<String>,
}

fn parse_kind(token: &str) -> ErrorKind {
    serde_json::from_value(Value::String(token.to_string()))
        .unwrap_or_else(|_| panic!("unknown error kind token: {token}"))
}

fn build(case: &Case) -> ToolError {
    let mut err = ToolError::new(parse_kind(&case.kind), case.message.clone());
    if let Some(recoverable) = case.recoverable {
        err = err.with_recoverable(recoverable);
    }
    for (key, value) in &case.data {
        err = err.with_data(key.clone(), value.clone());
    }
    err
}

#[test]
fn toolerror_wire_vectors() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("conformance")
        .join("toolerror.yaml");
    let raw = std::fs::read_to_string(&path).expect("read conformance vectors");
    let suite: Suite = serde_yaml::from_str(&raw).expect("parse conformance vectors");
    assert_eq!(suite.domain, "toolerror");
    assert!(!suite.tests.is_empty());

    for case in &suite.tests {
        let err = build(case);
        assert_eq!(err.wire(), case.expect_wire, "case: {}", case.name);

        // Parsing our own wire output must reproduce the value.
        let parsed: ToolError = serde_json::from_str(&err.wire()).expect("re-parse wire form");
        assert_eq!(parsed, err, "round-trip case: {}", case.name);

        if let Some(expected) = &case.expect_display {
            assert_eq!(&err.to_string(), expected, "display case: {}", case.name);
        }
    }
}
