//! Hand-written collaborators for controller tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use podium::analysis::{Analyzer, AnalyzerConfig};
use podium::collaborators::{
    CodeExecutor, CodeGenerator, CollaboratorError, CollaboratorResult, Collaborators,
    DataFetcher, DataRequirements, Execution, Interpretation, QueryInterpreter,
};
use podium::ResultTable;
use serde_json::{json, Value};

/// How a mocked stage misbehaves.
#[derive(Debug, Clone, Default)]
pub enum Fault {
    #[default]
    None,
    Fail(String),
    Hang,
    Panic(String),
}

impl Fault {
    async fn apply(&self) -> CollaboratorResult<()> {
        match self {
            Fault::None => Ok(()),
            Fault::Fail(msg) => Err(CollaboratorError::Failed(msg.clone())),
            Fault::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            Fault::Panic(msg) => panic!("{}", msg),
        }
    }
}

/// A scripted backend that records what it was asked to do.
#[derive(Default)]
pub struct Mock {
    pub interpretation: Interpretation,
    pub fetch_response: Value,
    pub code: String,
    /// `Some` makes execution report this failure output.
    pub execution_error: Option<Value>,

    pub interpret_fault: Fault,
    pub fetch_fault: Fault,
    pub generate_fault: Fault,
    pub execute_fault: Fault,

    pub generate_calls: AtomicUsize,
    pub execute_calls: AtomicUsize,
    pub fetched: Mutex<Vec<DataRequirements>>,
    pub generated_for: Mutex<Vec<ResultTable>>,
}

impl Mock {
    /// A backend that interprets every query as the 2021 constructor standings
    /// and fetches `data`.
    pub fn returning(data: Value) -> Self {
        Self {
            interpretation: Interpretation {
                endpoint: "constructor_standings".into(),
                params: json!({"season": "2021"}).as_object().cloned().unwrap(),
                confidence: 0.92,
                source: "mock".into(),
                trace: vec![
                    "detected season 2021".into(),
                    "detected constructor ferrari".into(),
                ],
            },
            fetch_response: json!({"success": true, "data": data}),
            code: "result = df.to_dict('records')".into(),
            ..Default::default()
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryInterpreter for Mock {
    async fn interpret(&self, _query: &str) -> CollaboratorResult<Interpretation> {
        self.interpret_fault.apply().await?;
        Ok(self.interpretation.clone())
    }
}

#[async_trait]
impl DataFetcher for Mock {
    async fn fetch(&self, requirements: &DataRequirements) -> CollaboratorResult<Value> {
        self.fetched.lock().unwrap().push(requirements.clone());
        self.fetch_fault.apply().await?;
        Ok(self.fetch_response.clone())
    }
}

#[async_trait]
impl CodeGenerator for Mock {
    async fn generate_code(&self, table: &ResultTable, _query: &str) -> CollaboratorResult<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generated_for.lock().unwrap().push(table.clone());
        self.generate_fault.apply().await?;
        Ok(self.code.clone())
    }
}

#[async_trait]
impl CodeExecutor for Mock {
    async fn execute_code(&self, code: &str, table: &ResultTable) -> CollaboratorResult<Execution> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.execute_fault.apply().await?;

        if let Some(error) = &self.execution_error {
            return Ok(Execution {
                success: false,
                output: error.clone(),
                executed_code: code.to_string(),
            });
        }
        Ok(Execution {
            success: true,
            output: json!({
                "row_count": table.num_rows(),
                "records": table.to_records(),
            }),
            executed_code: format!("import pandas as pd\n{code}"),
        })
    }
}

pub fn analyzer(mock: Arc<Mock>) -> Analyzer {
    Analyzer::new(
        Collaborators::with_backend(mock),
        AnalyzerConfig::default().with_stage_timeout(Duration::from_millis(200)),
    )
}
