//! Loader matrix: registries, references, embeds, scalars and the error
//! collector's cap.

mod common;

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use common::*;
use json_graph::{graph_from, Errors, FatalError, FieldValue, LoadOptions, ObjectGraph};
use json_graph_schema::{ClassId, Schema};
use serde_json::json;

fn person(schema: &Schema) -> ClassId {
    schema.class_id("Person").unwrap()
}

fn friend_of<'g>(schema: &Schema, graph: &'g ObjectGraph, id: &str) -> Option<&'g str> {
    let instance = graph.registry(person(schema)).get(id)?;
    let handle = instance.fields.get("friend")?.as_instance()?;
    graph.id_of(handle)
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

#[test]
fn registry_with_global_reference() {
    let schema = empties_schema();
    let graph = load_ok(
        &schema,
        json!({
            "empties": {"a": {}, "b": {}},
            "global_reference_to_an_empty": "a"
        }),
    );

    let empty = schema.class_id("Empty").unwrap();
    let ids: Vec<_> = graph.registry(empty).iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["a", "b"]);

    let handle = graph.fields["global_reference_to_an_empty"]
        .as_instance()
        .unwrap();
    assert_eq!(graph.id_of(handle), Some("a"));
    assert_eq!(graph.resolve(empty, "a"), Some(handle));
}

#[test]
fn missing_global_reference() {
    let errors = load_errors(&empties_schema(), json!({"empties": {"a": {}, "b": {}}}));
    assert_eq!(
        errors,
        vec!["#: Property is missing: global_reference_to_an_empty"]
    );
}

#[test]
fn missing_registry_is_empty() {
    let schema = social_schema();
    let graph = load_ok(&schema, json!({}));
    assert!(graph.registry(person(&schema)).is_empty());
    assert!(graph.fields.is_empty());
}

#[test]
fn registry_must_be_an_object() {
    let errors = load_errors(&social_schema(), json!({"people": ["alice"]}));
    assert_eq!(errors, vec!["#/people: Expected an object, but got: array"]);
}

#[test]
fn instance_must_be_an_object() {
    let errors = load_errors(&social_schema(), json!({"people": {"alice": "Alice"}}));
    assert_eq!(
        errors,
        vec!["#/people/alice: Expected an object, but got: string"]
    );
}

#[test]
fn id_pattern_rejects_before_population() {
    let errors = load_errors(
        &social_schema(),
        json!({
            "people": {"Alice": {"name": "Alice"}, "bob": {}},
            "team": ["nobody"]
        }),
    );
    // Population is skipped: neither bob's missing name nor the dangling
    // team member is reported.
    assert_eq!(
        errors,
        vec!["#/people: Expected ID to match [a-z][a-z0-9_]*, but got: Alice"]
    );
}

#[test]
fn instance_ids_equal_registry_keys() {
    let schema = social_schema();
    let graph = load_ok(
        &schema,
        json!({"people": {"alice": {"name": "Alice"}, "bob": {"name": "Bob"}}}),
    );
    for (key, instance) in graph.registry(person(&schema)).iter() {
        assert_eq!(key, instance.id());
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[test]
fn forward_reference() {
    let schema = social_schema();
    let graph = load_ok(
        &schema,
        json!({"people": {
            "alice": {"name": "Alice", "friend": "bob"},
            "bob": {"name": "Bob"}
        }}),
    );
    assert_eq!(friend_of(&schema, &graph, "alice"), Some("bob"));
    assert_eq!(friend_of(&schema, &graph, "bob"), None);
}

#[test]
fn cyclic_and_self_references() {
    let schema = social_schema();
    let graph = load_ok(
        &schema,
        json!({"people": {
            "alice": {"name": "Alice", "friend": "bob"},
            "bob": {"name": "Bob", "friend": "alice"},
            "carol": {"name": "Carol", "friend": "carol"}
        }}),
    );
    assert_eq!(friend_of(&schema, &graph, "alice"), Some("bob"));
    assert_eq!(friend_of(&schema, &graph, "bob"), Some("alice"));
    assert_eq!(friend_of(&schema, &graph, "carol"), Some("carol"));
}

#[test]
fn reference_not_found() {
    let errors = load_errors(
        &social_schema(),
        json!({"people": {"alice": {"name": "Alice", "friend": "carol"}}}),
    );
    assert_eq!(
        errors,
        vec!["#/people/alice/friend: Reference to an instance of class Person not found: carol"]
    );
}

#[test]
fn references_in_containers() {
    let schema = social_schema();
    let graph = load_ok(
        &schema,
        json!({
            "people": {"alice": {"name": "Alice"}, "bob": {"name": "Bob"}},
            "team": ["bob", "alice", "bob"],
            "by_role": {"lead": "alice", "deputy": "bob"}
        }),
    );

    let team: Vec<_> = graph.fields["team"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| graph.id_of(v.as_instance().unwrap()).unwrap())
        .collect();
    assert_eq!(team, vec!["bob", "alice", "bob"]);

    let roles: Vec<_> = graph.fields["by_role"]
        .as_map()
        .unwrap()
        .iter()
        .map(|(role, v)| (role.as_str(), graph.id_of(v.as_instance().unwrap()).unwrap()))
        .collect();
    assert_eq!(roles, vec![("lead", "alice"), ("deputy", "bob")]);
}

#[test]
fn container_errors_follow_tree_order() {
    let errors = load_errors(
        &social_schema(),
        json!({
            "team": ["x", 1],
            "by_role": {"zulu": "y", "alpha": "z"}
        }),
    );
    assert_eq!(
        errors,
        vec![
            "#/team/0: Reference to an instance of class Person not found: x",
            "#/team/1: Expected a string, but got: int",
            "#/by_role/zulu: Reference to an instance of class Person not found: y",
            "#/by_role/alpha: Reference to an instance of class Person not found: z",
        ]
    );
}

// ---------------------------------------------------------------------------
// Embeds
// ---------------------------------------------------------------------------

#[test]
fn embed_resolves_against_outer_registries() {
    let schema = social_schema();
    let graph = load_ok(
        &schema,
        json!({
            "people": {"alice": {"name": "Alice", "home": {"street": "Main", "owner": "alice"}}},
            "headquarters": {"street": "Station", "owner": "alice"}
        }),
    );

    let hq = graph.fields["headquarters"].as_embed().unwrap();
    assert_eq!(hq["street"].as_str(), Some("Station"));
    assert_eq!(graph.id_of(hq["owner"].as_instance().unwrap()), Some("alice"));

    let alice = graph.registry(person(&schema)).get("alice").unwrap();
    let home = alice.fields["home"].as_embed().unwrap();
    assert_eq!(graph.id_of(home["owner"].as_instance().unwrap()), Some("alice"));
}

#[test]
fn embed_errors_are_nested() {
    let errors = load_errors(
        &social_schema(),
        json!({
            "people": {"alice": {"name": "Alice", "home": {"owner": "zed"}}},
            "headquarters": []
        }),
    );
    assert_eq!(
        errors,
        vec![
            "#/people/alice/home: Property is missing: street",
            "#/people/alice/home/owner: Reference to an instance of class Person not found: zed",
            "#/headquarters: Expected an object, but got: array",
        ]
    );
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[test]
fn scalars_decode() {
    let schema = scalars_schema();
    let graph = load_ok(
        &schema,
        json!({
            "flag": true,
            "count": 9,
            "ratio": 1,
            "code": "ABC",
            "file": "/var/lib/data.json",
            "day": "2016-07-03",
            "clock": "07:30 PM",
            "moment": "2016-07-03T21:04:00Z",
            "zone": "Europe/Zurich",
            "timeout": "P1Y2M3DT4H5M6.5S",
            "sizes": [1, 2, 3]
        }),
    );
    let f = &graph.fields;
    assert_eq!(f["flag"].as_bool(), Some(true));
    assert_eq!(f["count"].as_integer(), Some(9));
    assert_eq!(f["ratio"].as_float(), Some(1.0));
    assert_eq!(f["code"].as_str(), Some("ABC"));
    assert_eq!(
        f["file"],
        FieldValue::Path(Path::new("/var/lib/data.json").to_path_buf())
    );
    assert_eq!(
        f["day"],
        FieldValue::Date(NaiveDate::from_ymd_opt(2016, 7, 3).unwrap())
    );
    assert_eq!(
        f["clock"],
        FieldValue::Time(NaiveTime::from_hms_opt(19, 30, 0).unwrap())
    );
    assert_eq!(
        f["moment"],
        FieldValue::Datetime(
            NaiveDate::from_ymd_opt(2016, 7, 3)
                .unwrap()
                .and_hms_opt(21, 4, 0)
                .unwrap()
        )
    );
    assert_eq!(f["zone"].as_str(), Some("Europe/Zurich"));
    assert_eq!(
        f["timeout"].as_duration().map(|d| d.as_nanos()),
        Some(37_090_350_500_000_000)
    );
    assert_eq!(f["sizes"].as_array().map(<[FieldValue]>::len), Some(3));
}

#[test]
fn absent_optional_properties_stay_unset() {
    let graph = load_ok(&scalars_schema(), json!({"flag": false}));
    assert_eq!(graph.fields.len(), 1);
    assert!(!graph.fields.contains_key("count"));
}

#[test]
fn type_mismatches_name_both_kinds() {
    let errors = load_errors(
        &scalars_schema(),
        json!({
            "flag": 1,
            "count": 1.5,
            "ratio": "half",
            "code": null,
            "sizes": {}
        }),
    );
    assert_eq!(
        errors,
        vec![
            "#/flag: Expected a bool, but got: int",
            "#/count: Expected an int64, but got: real",
            "#/ratio: Expected a double, but got: string",
            "#/code: Expected a string, but got: null",
            "#/sizes: Expected an array, but got: object",
        ]
    );
}

#[test]
fn numeric_ranges() {
    let errors = load_errors(&scalars_schema(), json!({"count": 10, "ratio": -0.5}));
    assert_eq!(
        errors,
        vec![
            "#/count: Expected < 10, but got: 10",
            "#/ratio: Expected >= 0, but got: -0.5",
        ]
    );
    let errors = load_errors(&scalars_schema(), json!({"count": -1, "ratio": 1.5}));
    assert_eq!(
        errors,
        vec![
            "#/count: Expected >= 0, but got: -1",
            "#/ratio: Expected <= 1, but got: 1.5",
        ]
    );
}

#[test]
fn array_sizes() {
    assert_eq!(
        load_errors(&scalars_schema(), json!({"sizes": []})),
        vec!["#/sizes: Expected an array of minimum size 1, but got: 0"]
    );
    assert_eq!(
        load_errors(&scalars_schema(), json!({"sizes": [1, 2, 3, 4]})),
        vec!["#/sizes: Expected an array of maximum size 3, but got: 4"]
    );
}

#[test]
fn string_pattern() {
    assert_eq!(
        load_errors(&scalars_schema(), json!({"code": "ABc"})),
        vec!["#/code: Expected to match [A-Z]+, but got: ABc"]
    );
}

#[test]
fn temporal_parse_failures() {
    let errors = load_errors(
        &scalars_schema(),
        json!({
            "day": "2016-07-03T",
            "clock": "19:30",
            "moment": "2016-07-03 21:04:00"
        }),
    );
    assert_eq!(
        errors,
        vec![
            "#/day: Expected to strptime %Y-%m-%d, but got: 2016-07-03T",
            "#/clock: Expected to strptime %I:%M %p, but got: 19:30",
            "#/moment: Expected to strptime %Y-%m-%dT%H:%M:%SZ, but got: 2016-07-03 21:04:00",
        ]
    );
}

#[test]
fn unknown_time_zones() {
    assert_eq!(
        load_errors(&scalars_schema(), json!({"zone": "Mars/Olympus Mons"})),
        vec!["#/zone: Expected a valid IANA time zone, but got: Mars/Olympus Mons"]
    );
    assert_eq!(
        load_errors(&scalars_schema(), json!({"zone": "Europe/Atlantis"})),
        vec!["#/zone: Expected a valid IANA time zone, but got: Europe/Atlantis"]
    );
    let graph = load_ok(&scalars_schema(), json!({"zone": "America/Argentina/Salta"}));
    assert_eq!(graph.fields["zone"].as_str(), Some("America/Argentina/Salta"));
}

#[test]
fn partial_temporal_formats_fill_defaults() {
    let schema = schema(json!({
        "name": "Partial",
        "properties": {
            "month": {"type": "date", "format": "%Y-%m"},
            "hour": {"type": "time", "format": "%I %p"},
            "day": {"type": "datetime", "format": "%Y-%m-%d"}
        }
    }));
    let graph = load_ok(
        &schema,
        json!({"month": "2016-07", "hour": "07 PM", "day": "2016-07-03"}),
    );
    assert_eq!(
        graph.fields["month"],
        FieldValue::Date(NaiveDate::from_ymd_opt(2016, 7, 1).unwrap())
    );
    assert_eq!(
        graph.fields["hour"],
        FieldValue::Time(NaiveTime::from_hms_opt(19, 0, 0).unwrap())
    );
    assert_eq!(
        graph.fields["day"],
        FieldValue::Datetime(
            NaiveDate::from_ymd_opt(2016, 7, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
}

#[test]
fn offset_datetimes_keep_their_offset() {
    let schema = schema(json!({
        "name": "Offsets",
        "properties": {
            "stamp": {"type": "datetime", "format": "%Y-%m-%d %H:%M %z"}
        }
    }));
    let graph = load_ok(&schema, json!({"stamp": "2016-07-03 21:04 -0130"}));
    let FieldValue::OffsetDatetime(stamp) = &graph.fields["stamp"] else {
        panic!("expected an offset datetime, got {:?}", graph.fields["stamp"]);
    };
    assert_eq!(stamp.offset().local_minus_utc(), -90 * 60);
    assert_eq!(
        stamp.naive_utc(),
        NaiveDate::from_ymd_opt(2016, 7, 3)
            .unwrap()
            .and_hms_opt(22, 34, 0)
            .unwrap()
    );

    assert_eq!(
        load_errors(&schema, json!({"stamp": "2016-07-03 21:04"})),
        vec!["#/stamp: Expected to strptime %Y-%m-%d %H:%M %z, but got: 2016-07-03 21:04"]
    );
}

#[test]
fn duration_errors() {
    assert_eq!(
        load_errors(&scalars_schema(), json!({"timeout": "1 hour"})),
        vec!["#/timeout: failed to match the duration: 1 hour"]
    );
    assert_eq!(
        load_errors(&scalars_schema(), json!({"timeout": "PT1.1234567891S"})),
        vec![
            "#/timeout: converting the duration to nanoseconds results in loss of precision: PT1.1234567891S"
        ]
    );
    assert_eq!(
        load_errors(&scalars_schema(), json!({"timeout": "P300Y"})),
        vec!["#/timeout: duration overflows as nanoseconds: P300Y"]
    );
}

// ---------------------------------------------------------------------------
// Error collector
// ---------------------------------------------------------------------------

#[test]
fn cap_bounds_recorded_errors() {
    let schema = schema(json!({
        "name": "Numbers",
        "properties": {"numbers": {"type": "array", "values": {"type": "integer"}}}
    }));
    let tree = json!({"numbers": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]});
    let options = LoadOptions {
        max_errors: 3,
        ..LoadOptions::default()
    };
    let errors = load_with(&schema, &tree, &options).unwrap_err();
    assert_eq!(
        errors,
        vec![
            "#/numbers/0: Expected an int64, but got: string",
            "#/numbers/1: Expected an int64, but got: string",
            "#/numbers/2: Expected an int64, but got: string",
        ]
    );
}

#[test]
fn full_collector_stops_population() {
    let options = LoadOptions {
        max_errors: 2,
        ..LoadOptions::default()
    };
    let tree = json!({"people": {"a": {}, "b": {}, "c": {}}});
    let errors = load_with(&social_schema(), &tree, &options).unwrap_err();
    assert_eq!(
        errors,
        vec![
            "#/people/a: Property is missing: name",
            "#/people/b: Property is missing: name",
        ]
    );
}

#[test]
fn collector_must_start_empty() {
    let schema = empties_schema();
    let mut errors = Errors::new(8);
    assert!(graph_from(&schema, &json!([]), "#", &mut errors).is_ok());
    assert_eq!(errors.len(), 1);

    let again = graph_from(&schema, &json!({}), "#", &mut errors);
    assert_eq!(again.unwrap_err(), FatalError::NonEmptyErrors(1));
}

#[test]
fn caller_chooses_the_root_path() {
    let schema = empties_schema();
    let mut errors = Errors::new(8);
    graph_from(&schema, &json!({"empties": []}), "config.json#", &mut errors).unwrap();
    assert_eq!(
        errors.entries()[0].to_string(),
        "config.json#/empties: Expected an object, but got: array"
    );
}
