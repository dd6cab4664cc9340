//! Normalization properties over realistic pipeline payloads.

use podium::normalize::{normalize, normalize_with_report, NormalizeConfig};
use podium::table::coerce_payload;
use podium::ResultTable;
use serde_json::{json, Value};

fn table(payload: Value) -> ResultTable {
    coerce_payload(&payload).unwrap()
}

fn standings() -> ResultTable {
    table(json!([
        {"season": "2021", "year": 2021, "round": "1", "ConstructorTable": [{"constructorId": "ferrari"}]},
        {"season": "2021", "year": 2021, "round": "1", "ConstructorTable": "[{'constructorId': 'ferrari'}]"},
        {"season": "2021", "year": 2021, "round": "2", "ConstructorTable": "2021"},
        {"season": "2020", "year": 2021, "round": "3", "ConstructorTable": []},
        {"season": "2021", "year": 2021, "round": "4", "ConstructorTable": null},
    ]))
}

#[test]
fn test_standings_are_cleaned() {
    let (out, report) = normalize_with_report(standings(), &NormalizeConfig::default());

    assert_eq!(out.columns(), &["year", "round", "ConstructorTable"]);
    let rounds: Vec<&Value> = out.column_values("round").unwrap();
    assert_eq!(rounds, vec![&json!("1"), &json!("4")]);

    assert_eq!(report.input_rows, 5);
    assert_eq!(report.numeric_constructor_rows, 1);
    assert_eq!(report.duplicate_rows, 1);
    assert_eq!(report.season_mismatch_rows, 1);
    assert!(report.season_column_dropped);
    assert_eq!(report.rows_removed(), 3);
}

#[test]
fn test_normalize_is_idempotent() {
    let config = NormalizeConfig::default();
    let once = normalize(standings(), &config);
    let twice = normalize(once.clone(), &config);
    assert_eq!(once, twice);
}

#[test]
fn test_mixed_season_types_are_idempotent() {
    let config = NormalizeConfig::default();
    let input = table(json!([
        {"year": 2021, "season": 2021, "round": "1", "ConstructorTable": []},
        {"year": 2021, "season": "2021", "round": "1", "ConstructorTable": [{"constructorId": "ferrari"}]},
        {"year": "2022", "season": 2022, "round": "1", "ConstructorTable": []},
        {"year": 2022, "season": "2022", "round": "1", "ConstructorTable": []},
    ]));
    let once = normalize(input, &config);
    let twice = normalize(once.clone(), &config);
    assert_eq!(once, twice);

    let mut keys: Vec<String> = once
        .to_records()
        .into_iter()
        .map(|mut r| {
            r.remove("ConstructorTable");
            serde_json::to_string(&r).unwrap()
        })
        .collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
    assert_eq!(total, 3);
}

#[test]
fn test_normalize_never_adds_rows_or_columns() {
    let config = NormalizeConfig::default();
    let inputs = [
        standings(),
        table(json!([{"a": 1}, {"a": 1}, {"b": 2}])),
        table(json!({"columns": ["year", "season"], "rows": [[2021, 2021], [2021, "2021"]]})),
        table(json!({"columns": [], "rows": []})),
    ];
    for input in inputs {
        let out = normalize(input.clone(), &config);
        assert!(out.num_rows() <= input.num_rows());
        assert!(out.num_columns() <= input.num_columns());
    }
}

#[test]
fn test_surviving_rows_have_matching_year_and_season() {
    let input = table(json!([
        {"year": 2021, "season": "2021"},
        {"year": "2021", "season": 2021.0},
        {"year": 2019, "season": "2020"},
    ]));
    let out = normalize(input, &NormalizeConfig::default());
    assert!(!out.has_column("season"));
    assert_eq!(out.num_rows(), 2);
}

#[test]
fn test_season_alone_is_kept() {
    let input = table(json!([{"season": "2021", "points": 90}]));
    let out = normalize(input.clone(), &NormalizeConfig::default());
    assert_eq!(out, input);
}

#[test]
fn test_numeric_constructor_cells_are_gone() {
    let input = table(json!([
        {"round": "1", "ConstructorTable": "2021"},
        {"round": "2", "ConstructorTable": 2021},
        {"round": "3", "ConstructorTable": "twenty"},
        {"round": "4", "ConstructorTable": ""},
    ]));
    let out = normalize(input, &NormalizeConfig::default());
    let cells = out.column_values("ConstructorTable").unwrap();
    assert_eq!(cells, vec![&json!("twenty"), &json!("")]);
}

#[test]
fn test_duplicates_ignore_the_constructor_column() {
    let input = table(json!([
        {"round": "1", "ConstructorTable": [{"constructorId": "ferrari"}]},
        {"round": "1", "ConstructorTable": [{"constructorId": "mclaren"}]},
        {"round": "2", "ConstructorTable": [{"constructorId": "ferrari"}]},
    ]));
    let out = normalize(input, &NormalizeConfig::default());
    assert_eq!(out.num_rows(), 2);
    assert_eq!(
        out.column_values("ConstructorTable").unwrap()[0],
        &json!([{"constructorId": "ferrari"}])
    );
}

#[test]
fn test_custom_column_names() {
    let config = NormalizeConfig {
        constructor_column: "teams".into(),
        year_column: "yr".into(),
        season_column: "ssn".into(),
    };
    let input = table(json!([
        {"yr": 2021, "ssn": 2021, "teams": "7"},
        {"yr": 2021, "ssn": 2021, "teams": []},
    ]));
    let out = normalize(input, &config);
    assert_eq!(out.columns(), &["yr", "teams"]);
    assert_eq!(out.num_rows(), 1);
}
