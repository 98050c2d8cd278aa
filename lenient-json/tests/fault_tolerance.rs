use std::collections::HashMap;
use std::sync::Arc;

use lenient_core::{FaultSite, TokenKind, describe};
use lenient_json::Lenient;
use lenient_testhelpers::{FaultEvent, FaultLog, IPanic};

#[derive(Debug, PartialEq)]
struct Order {
    count: i32,
    name: String,
    tags: Vec<String>,
}

describe! {
    Order { count: i32, name: String, tags: Vec<String> }
}

#[derive(Debug, PartialEq)]
struct Labeled {
    id: i32,
    label: String,
}

impl Labeled {
    fn new(id: i32, label: String) -> Self {
        Self { id, label }
    }
}

describe! {
    Labeled { id: i32, label: String }
    construct = new(id: i32, label: String)
}

#[derive(Debug, PartialEq)]
struct Readings {
    values: Vec<i32>,
    limits: HashMap<String, i32>,
}

describe! {
    Readings { values: Vec<i32>, limits: HashMap<String, i32> }
}

fn logged() -> (Lenient, Arc<FaultLog>) {
    lenient_testhelpers::setup();
    let log = Arc::new(FaultLog::new());
    let lenient = Lenient::builder().fault_callback(log.clone()).build();
    (lenient, log)
}

#[test]
fn wrong_token_types_are_isolated_per_field() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let order: Order =
        lenient.from_str(r#"{"count":"abc","name":42,"tags":[1,"ok",true]}"#)?;

    assert_eq!(
        order,
        Order {
            count: 0,
            name: "42".into(),
            tags: vec!["1".into(), "ok".into(), "true".into()],
        }
    );
    assert_eq!(
        log.events(),
        [FaultEvent {
            site: FaultSite::Field,
            owner: "Order".into(),
            field: Some("count"),
            expected: "i32".into(),
            token: TokenKind::String,
            path: "$.count".into(),
        }]
    );
    Ok(())
}

#[test]
fn empty_object_uses_synthesized_constructor_arguments() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let labeled: Labeled = lenient.from_str("{}")?;

    assert_eq!(labeled, Labeled::new(0, String::new()));
    assert!(log.is_empty());
    Ok(())
}

#[test]
fn list_faults_are_reported_by_index() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let readings: Readings = lenient.from_str(r#"{"values": [1, "x", 3, {"a": 1}, 5]}"#)?;

    assert_eq!(readings.values, [1, 0, 3, 0, 5]);
    let sites: Vec<_> = log
        .events()
        .into_iter()
        .map(|e| (e.site, e.owner, e.field, e.token, e.path))
        .collect();
    assert_eq!(
        sites,
        [
            (
                FaultSite::ListItem { index: 1 },
                "Vec<i32>".to_string(),
                Some("values"),
                TokenKind::String,
                "$.values[1]".to_string(),
            ),
            (
                FaultSite::ListItem { index: 3 },
                "Vec<i32>".to_string(),
                Some("values"),
                TokenKind::BeginObject,
                "$.values[3]".to_string(),
            ),
        ]
    );
    Ok(())
}

#[test]
fn map_faults_are_reported_by_key() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let readings: Readings =
        lenient.from_str(r#"{"limits": {"low": 1, "high": "lots", "none": null}}"#)?;

    assert_eq!(readings.limits.len(), 3);
    assert_eq!(readings.limits["low"], 1);
    assert_eq!(readings.limits["high"], 0);
    assert_eq!(readings.limits["none"], 0);

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].site, FaultSite::MapEntry { key: "high".into() });
    assert_eq!(events[0].owner, "HashMap<String, i32>");
    assert_eq!(events[0].path, "$.limits.high");
    Ok(())
}

#[test]
fn container_of_the_wrong_kind_becomes_empty() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let readings: Readings = lenient.from_str(r#"{"values": "1,2,3", "limits": [1]}"#)?;

    assert!(readings.values.is_empty());
    assert!(readings.limits.is_empty());
    let tokens: Vec<_> = log.events().into_iter().map(|e| (e.field, e.token)).collect();
    assert_eq!(
        tokens,
        [
            (Some("values"), TokenKind::String),
            (Some("limits"), TokenKind::BeginArray),
        ]
    );
    Ok(())
}

#[test]
fn faults_do_not_disturb_later_fields() -> Result<(), IPanic> {
    let (lenient, log) = logged();

    let order: Order = lenient.from_str(
        r#"{"count": {"deep": [1, {"x": [2]}]}, "name": "kept", "tags": ["a"]}"#,
    )?;

    assert_eq!(order.count, 0);
    assert_eq!(order.name, "kept");
    assert_eq!(order.tags, ["a"]);
    assert_eq!(log.len(), 1);
    assert_eq!(log.events()[0].token, TokenKind::BeginObject);
    Ok(())
}

#[test]
fn decoding_twice_gives_the_same_result() -> Result<(), IPanic> {
    let input = r#"{"count": "many", "name": [1], "tags": [1, {"a": 2}, null, "x"], "extra": 1}"#;

    let (first_lenient, first_log) = logged();
    let first: Order = first_lenient.from_str(input)?;
    let (second_lenient, second_log) = logged();
    let second: Order = second_lenient.from_str(input)?;

    assert_eq!(first, second);
    assert_eq!(first.tags, ["1", "", "", "x"]);
    assert_eq!(first_log.len(), 3);
    assert_eq!(first_log.events(), second_log.events());
    Ok(())
}

#[test]
fn reencoded_output_decodes_cleanly() -> Result<(), IPanic> {
    let (lenient, log) = logged();
    let input = r#"{"count": 2.9, "name": true, "tags": [false, null, 3]}"#;

    let first: Order = lenient.from_str(input)?;
    let again: Order = lenient.from_str(&lenient.to_string(&first)?)?;

    assert_eq!(first, again);
    assert_eq!(first.tags, ["false", "", "3"]);
    assert!(log.is_empty());
    Ok(())
}

#[derive(Debug, PartialEq)]
struct Shipment {
    id: i64,
    origin: Labeled,
    lines: Vec<Order>,
    stock: HashMap<String, i32>,
    note: Option<String>,
    backup: Option<Labeled>,
}

describe! {
    Shipment {
        id: i64,
        origin: Labeled,
        lines: Vec<Order>,
        stock: HashMap<String, i32>,
        note: Option<String>,
        backup: Option<Labeled>,
    }
}

#[test]
fn nested_values_survive_a_round_trip() -> Result<(), IPanic> {
    let (lenient, log) = logged();
    let shipment = Shipment {
        id: 77,
        origin: Labeled::new(3, "dock".into()),
        lines: vec![
            Order {
                count: 2,
                name: "bolts".into(),
                tags: vec!["steel".into()],
            },
            Order {
                count: 0,
                name: String::new(),
                tags: Vec::new(),
            },
        ],
        stock: HashMap::from([("bolts".to_string(), 40), ("nuts".to_string(), -1)]),
        note: None,
        backup: Some(Labeled::new(9, "yard".into())),
    };

    let decoded: Shipment = lenient.from_str(&lenient.to_string(&shipment)?)?;

    assert_eq!(decoded, shipment);
    assert!(log.is_empty());
    Ok(())
}

#[test]
fn default_configuration_ignores_faults() -> Result<(), IPanic> {
    lenient_testhelpers::setup();

    let order: Order = lenient_json::from_str(r#"{"count": [], "name": null}"#)?;

    assert_eq!(order, Order { count: 0, name: String::new(), tags: Vec::new() });
    Ok(())
}
