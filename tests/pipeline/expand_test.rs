//! Constructor expansion over mixed cell encodings.

use podium::expand::{expand, flatten_records, ExpandConfig};
use podium::table::coerce_payload;
use podium::ResultTable;
use serde_json::{json, Value};

fn table(payload: Value) -> ResultTable {
    coerce_payload(&payload).unwrap()
}

fn records(t: &ResultTable) -> Value {
    Value::Array(t.to_records().into_iter().map(Value::Object).collect())
}

#[test]
fn test_ferrari_is_picked_over_mclaren() {
    let input = table(json!([{
        "round": "22",
        "ConstructorTable": [
            {"constructorId": "mclaren", "points": 50},
            {"constructorId": "ferrari", "points": 90}
        ]
    }]));
    let out = expand(input, &ExpandConfig::default());

    assert_eq!(records(&out), json!([{"round": "22", "constructorId": "ferrari", "points": 90}]));
}

#[test]
fn test_every_encoding_in_one_column() {
    let input = table(json!([
        {"round": "1", "ConstructorTable": [{"constructorId": "ferrari", "points": 10}]},
        {"round": "2", "ConstructorTable": "[{\"constructorId\": \"ferrari\", \"points\": 20}]"},
        {"round": "3", "ConstructorTable": "[{'constructorId': 'ferrari', 'points': 30, 'wins': None}]"},
        {"round": "4", "ConstructorTable": "[{broken"},
        {"round": "5", "ConstructorTable": {"constructorId": "ferrari"}},
        {"round": "6", "ConstructorTable": null},
    ]));
    let out = expand(input, &ExpandConfig::default());

    assert_eq!(out.columns(), &["round", "constructorId", "points", "wins"]);
    assert_eq!(out.num_rows(), 6);
    assert_eq!(
        out.column_values("points").unwrap(),
        vec![&json!(10), &json!(20), &json!(30), &Value::Null, &Value::Null, &Value::Null]
    );
}

#[test]
fn test_nested_fields_become_dotted_columns() {
    let input = table(json!([{
        "ConstructorTable": "[{'constructorId': 'ferrari', 'Constructor': {'name': 'Ferrari', 'meta': {'founded': 1939}}, 'drivers': ['leclerc', 'sainz']}]"
    }]));
    let out = expand(input, &ExpandConfig::default());

    assert_eq!(
        out.columns(),
        &["constructorId", "Constructor.name", "Constructor.meta.founded", "drivers"]
    );
    assert_eq!(
        records(&out),
        json!([{
            "constructorId": "ferrari",
            "Constructor.name": "Ferrari",
            "Constructor.meta.founded": 1939,
            "drivers": ["leclerc", "sainz"]
        }])
    );
}

#[test]
fn test_clashing_names_get_a_suffix() {
    let input = table(json!([{
        "points": 409,
        "ConstructorTable": [{"constructorId": "ferrari", "points": 90}]
    }]));
    let out = expand(input, &ExpandConfig::default());
    assert_eq!(out.columns(), &["points", "constructorId", "points_constructor"]);
}

#[test]
fn test_another_target_constructor() {
    let config = ExpandConfig {
        target_id: "mclaren".into(),
        ..Default::default()
    };
    let input = table(json!([{
        "ConstructorTable": [
            {"constructorId": "ferrari", "points": 90},
            {"constructorId": "mclaren", "points": 50}
        ]
    }]));
    let out = expand(input, &config);
    assert_eq!(records(&out), json!([{"constructorId": "mclaren", "points": 50}]));
}

#[test]
fn test_garbage_only_drops_the_column() {
    let input = table(json!([
        {"round": "1", "ConstructorTable": "garbage"},
        {"round": "2", "ConstructorTable": 7},
    ]));
    let out = expand(input, &ExpandConfig::default());
    assert_eq!(records(&out), json!([{"round": "1"}, {"round": "2"}]));
}

#[test]
fn test_too_deep_record_leaves_table_without_new_columns() {
    let config = ExpandConfig {
        max_depth: 2,
        ..Default::default()
    };
    let input = table(json!([{
        "round": "1",
        "ConstructorTable": [{"constructorId": "ferrari", "a": {"b": {"c": 1}}}]
    }]));
    let out = expand(input, &config);
    assert_eq!(out.columns(), &["round"]);
}

#[test]
fn test_flatten_fills_missing_fields_with_null() {
    let rows = [
        json!({"constructorId": "ferrari", "points": 90}),
        json!({}),
        json!({"wins": 3}),
    ];
    let maps: Vec<_> = rows.iter().map(|v| v.as_object().cloned().unwrap()).collect();
    let columns = flatten_records(&maps, 16, "_constructor").unwrap();

    let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["constructorId", "points", "wins"]);
    assert_eq!(columns[2].1, vec![Value::Null, Value::Null, json!(3)]);
}

#[test]
fn test_table_without_constructor_column_is_unchanged() {
    let input = table(json!([{"round": "1", "points": 90}]));
    assert_eq!(expand(input.clone(), &ExpandConfig::default()), input);
}
