//! Every failure path renders a failure response and stops the pipeline.

mod common;

use std::sync::Arc;

use common::{analyzer, Fault, Mock};
use podium::analysis::{AnalysisRequest, AnalysisResponse, FAILURE_LABEL};
use podium::history::HistoryStore;
use serde_json::json;

fn standings() -> serde_json::Value {
    json!({"results": [{"year": 2021, "ConstructorTable": [{"constructorId": "ferrari", "points": 90}]}]})
}

async fn details(mock: Mock) -> String {
    let response = analyzer(Arc::new(mock))
        .analyze(AnalysisRequest::new("ferrari 2021"))
        .await;
    failure_details(&response)
}

fn failure_details(response: &AnalysisResponse) -> String {
    let failure = response.as_failure().expect("analysis should fail");
    assert!(!failure.success);
    assert_eq!(failure.error, FAILURE_LABEL);
    assert!(failure.processing_time >= 0.0);
    failure.details.clone()
}

#[tokio::test]
async fn test_pipeline_failure_stops_before_code_generation() {
    let mock = Arc::new(Mock {
        fetch_response: json!({"success": false, "error": "upstream 503"}),
        ..Mock::returning(json!(null))
    });
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari 2021"))
        .await;

    insta::assert_snapshot!(failure_details(&response), @"Pipeline processing failed: upstream 503");
    assert_eq!(mock.generate_calls(), 0);
    assert_eq!(mock.execute_calls(), 0);
}

#[tokio::test]
async fn test_successful_pipeline_without_data() {
    let mock = Mock {
        fetch_response: json!({"success": true}),
        ..Mock::returning(json!(null))
    };
    insta::assert_snapshot!(details(mock).await, @"Pipeline processing failed: No data returned");
}

#[tokio::test]
async fn test_scalar_payload_is_a_shape_error() {
    insta::assert_snapshot!(
        details(Mock::returning(json!({"results": 42}))).await,
        @"Failed to process data: Cannot process results of type: number"
    );
}

#[tokio::test]
async fn test_nothing_left_after_cleaning() {
    let data = json!({"results": [
        {"year": 2021, "ConstructorTable": "2021"},
        {"year": 2022, "ConstructorTable": 2022}
    ]});
    let mock = Arc::new(Mock::returning(data));
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari"))
        .await;

    insta::assert_snapshot!(
        failure_details(&response),
        @"Failed to process data: No data available after processing"
    );
    assert_eq!(mock.generate_calls(), 0);
}

#[tokio::test]
async fn test_interpretation_failure() {
    let mock = Arc::new(Mock {
        interpret_fault: Fault::Fail("no entities recognized".into()),
        ..Mock::returning(standings())
    });
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("???"))
        .await;

    insta::assert_snapshot!(
        failure_details(&response),
        @"Query interpretation failed: no entities recognized"
    );
    assert!(mock.fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_interpretation_without_endpoint() {
    let mut mock = Mock::returning(standings());
    mock.interpretation.endpoint = "   ".into();
    insta::assert_snapshot!(
        details(mock).await,
        @"Query adaptation failed: interpretation has no endpoint"
    );
}

#[tokio::test]
async fn test_non_object_pipeline_response() {
    let mock = Mock {
        fetch_response: json!([1, 2, 3]),
        ..Mock::returning(json!(null))
    };
    insta::assert_snapshot!(
        details(mock).await,
        @"Query adaptation failed: invalid response: expected a pipeline response object, got list"
    );
}

#[tokio::test]
async fn test_code_generation_failure() {
    let mock = Arc::new(Mock {
        generate_fault: Fault::Fail("model refused".into()),
        ..Mock::returning(standings())
    });
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari"))
        .await;

    insta::assert_snapshot!(failure_details(&response), @"Code generation failed: model refused");
    assert_eq!(mock.execute_calls(), 0);
}

#[tokio::test]
async fn test_code_execution_failure() {
    let mock = Mock {
        execution_error: Some(json!("NameError: name 'df2' is not defined")),
        ..Mock::returning(standings())
    };
    insta::assert_snapshot!(
        details(mock).await,
        @"Code execution failed: NameError: name 'df2' is not defined"
    );
}

#[tokio::test]
async fn test_executor_error() {
    let mock = Mock {
        execute_fault: Fault::Fail("sandbox unavailable".into()),
        ..Mock::returning(standings())
    };
    insta::assert_snapshot!(details(mock).await, @"Code execution failed: sandbox unavailable");
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock = Arc::new(Mock {
        fetch_fault: Fault::Hang,
        ..Mock::returning(standings())
    });
    let response = analyzer(mock.clone())
        .analyze(AnalysisRequest::new("ferrari"))
        .await;

    insta::assert_snapshot!(
        failure_details(&response),
        @"Pipeline processing failed: data fetch timed out after 0.2 seconds"
    );
    assert!(response.processing_time() < 5.0);
    assert_eq!(mock.generate_calls(), 0);
}

#[tokio::test]
async fn test_generation_timeout() {
    let mock = Mock {
        generate_fault: Fault::Hang,
        ..Mock::returning(standings())
    };
    insta::assert_snapshot!(
        details(mock).await,
        @"Code generation failed: code generation timed out after 0.2 seconds"
    );
}

#[tokio::test]
async fn test_panicking_collaborator() {
    let mock = Mock {
        interpret_fault: Fault::Panic("interpreter state corrupted".into()),
        ..Mock::returning(standings())
    };
    insta::assert_snapshot!(details(mock).await, @"Unexpected error: interpreter state corrupted");
}

#[tokio::test]
async fn test_failure_is_recorded_in_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path().join("history.db")).unwrap();
    let mock = Arc::new(Mock {
        generate_fault: Fault::Fail("model refused".into()),
        ..Mock::returning(standings())
    });

    analyzer(mock)
        .with_history(store.clone())
        .analyze(AnalysisRequest::new("ferrari"))
        .await;

    let entries = store.recent(5).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert_eq!(entries[0].response["success"], json!(false));
    assert_eq!(
        entries[0].response["details"],
        json!("Code generation failed: model refused")
    );
}
