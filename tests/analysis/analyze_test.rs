//! End-to-end analysis requests against mocked collaborators.

mod common;

use std::sync::Arc;

use common::{analyzer, Mock};
use podium::analysis::AnalysisRequest;
use podium::history::HistoryStore;
use serde_json::json;

fn two_row_standings() -> serde_json::Value {
    json!({
        "results": [
            {
                "season": "2021",
                "year": 2021,
                "round": "22",
                "ConstructorTable": "[{'constructorId': 'ferrari', 'points': 90, 'Constructor': {'nationality': 'Italian'}}, {'constructorId': 'mclaren', 'points': 50}]"
            },
            {
                "season": "2021",
                "year": 2021,
                "round": "21",
                "ConstructorTable": "2021"
            }
        ]
    })
}

#[tokio::test]
async fn test_end_to_end_ferrari_query() {
    let mock = Arc::new(Mock::returning(two_row_standings()));
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("How many points did Ferrari have in 2021?"))
        .await;

    let success = response.as_success().expect("analysis should succeed");
    assert!(success.success);
    assert_eq!(success.data["row_count"], json!(1));

    let record = &success.data["records"][0];
    assert_eq!(record["round"], json!("22"));
    assert_eq!(record["points"], json!(90));
    assert_eq!(record["constructorId"], json!("ferrari"));
    assert_eq!(record["Constructor.nationality"], json!("Italian"));
    assert!(record.get("ConstructorTable").is_none());
    assert!(record.get("season").is_none());

    assert!(!success.executed_code.is_empty());
    assert!(success.executed_code.starts_with("import pandas"));
    assert!(success.processing_time > 0.0);
    assert_eq!(
        success.query_trace,
        vec!["detected season 2021", "detected constructor ferrari"]
    );
    assert_eq!(success.metadata["source"], json!("pipeline"));
    assert!(success.metadata.contains_key("cache_key"));

    assert_eq!(mock.generate_calls(), 1);
    assert_eq!(mock.execute_calls(), 1);
}

#[tokio::test]
async fn test_generator_sees_the_cleaned_table() {
    let mock = Arc::new(Mock::returning(two_row_standings()));
    analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari 2021"))
        .await;

    let tables = mock.generated_for.lock().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(
        tables[0].columns(),
        &["year", "round", "constructorId", "points", "Constructor.nationality"]
    );
    assert_eq!(tables[0].num_rows(), 1);
}

#[tokio::test]
async fn test_fetch_receives_adapted_requirements() {
    let mock = Arc::new(Mock::returning(two_row_standings()));
    analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari 2021"))
        .await;

    let fetched = mock.fetched.lock().unwrap();
    assert_eq!(fetched[0].endpoint, "constructor_standings");
    assert_eq!(fetched[0].params["season"], json!("2021"));
    assert_eq!(fetched[0].metadata["source"], json!("mock"));
    assert_eq!(fetched[0].metadata["trace_len"], json!(2));
}

#[tokio::test]
async fn test_data_without_results_key_is_the_payload() {
    let mock = Arc::new(Mock::returning(json!([
        {"driver": "leclerc", "wins": 0},
        {"driver": "sainz", "wins": 0},
    ])));
    let response = analyzer(mock)
        .analyze(AnalysisRequest::new("ferrari driver wins"))
        .await;

    let success = response.as_success().unwrap();
    assert_eq!(success.data["row_count"], json!(2));
}

#[tokio::test]
async fn test_table_shaped_payload_passes_through() {
    let mock = Arc::new(Mock::returning(json!({
        "results": {
            "columns": ["season", "points"],
            "rows": [["2021", 323.5], ["2022", 554]]
        }
    })));
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari points by season"))
        .await;

    assert!(response.is_success());
    let tables = mock.generated_for.lock().unwrap();
    assert_eq!(tables[0].columns(), &["season", "points"]);
    assert_eq!(tables[0].num_rows(), 2);
}

#[tokio::test]
async fn test_rows_without_ferrari_keep_their_columns() {
    let mock = Arc::new(Mock::returning(json!({
        "results": [
            {"round": "1", "ConstructorTable": [{"constructorId": "mclaren", "points": 50}]},
            {"round": "2", "ConstructorTable": "not a list"}
        ]
    })));
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari"))
        .await;

    assert!(response.is_success());
    let tables = mock.generated_for.lock().unwrap();
    assert_eq!(tables[0].columns(), &["round"]);
    assert_eq!(tables[0].num_rows(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let ok = Arc::new(Mock::returning(two_row_standings()));
    let empty = Arc::new(Mock::returning(json!({"results": []})));
    let (a, b) = (analyzer(ok), analyzer(empty));

    let (ra, rb) = tokio::join!(
        a.analyze(AnalysisRequest::new("first")),
        b.analyze(AnalysisRequest::new("second")),
    );
    assert!(ra.is_success());
    assert!(!rb.is_success());
}

#[tokio::test]
async fn test_history_records_every_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path().join("history.db")).unwrap();

    let ok = analyzer(Arc::new(Mock::returning(two_row_standings()))).with_history(store.clone());
    let bad = analyzer(Arc::new(Mock::returning(json!(42)))).with_history(store.clone());

    ok.analyze(AnalysisRequest::new("ferrari 2021")).await;
    bad.analyze(AnalysisRequest::new("scalar")).await;

    let entries = store.recent(10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].query, "scalar");
    assert!(!entries[0].success);
    assert_eq!(entries[0].response["error"], json!("Analysis failed"));
    assert_eq!(entries[1].query, "ferrari 2021");
    assert!(entries[1].success);
    assert_eq!(entries[1].response["data"]["row_count"], json!(1));
}

#[tokio::test]
async fn test_broken_history_does_not_change_the_response() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let store = HistoryStore::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let response = analyzer(Arc::new(Mock::returning(two_row_standings())))
        .with_history(store)
        .analyze(AnalysisRequest::new("ferrari 2021"))
        .await;
    assert!(response.is_success());
}
