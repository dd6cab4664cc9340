//! Async client for communicating with the analyst worker process.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{codes, ErrorInfo, RequestEnvelope, ResponseEnvelope};
use crate::config::Settings;

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Async client for the analyst worker.
///
/// The client spawns the worker as a child process and communicates via
/// NDJSON (newline-delimited JSON) over stdin/stdout. Each request has a
/// unique ID for correlation with responses, so concurrent analyses can
/// share one worker.
///
/// # Example
///
/// ```ignore
/// use podium::worker::{WorkerClient, protocol::*};
///
/// let client = WorkerClient::spawn("./podium-worker", &[], Duration::from_secs(30)).await?;
///
/// let interpretation: Interpretation = client
///     .request(methods::INTERPRET, InterpretParams { query: "ferrari points 2021" })
///     .await?;
/// ```
pub struct WorkerClient {
    /// Writer for sending requests to worker stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: PendingMap,

    /// Handle to the worker child process.
    _child: Child,

    /// Handle to the background reader task.
    reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl WorkerClient {
    /// Spawn a worker using settings configuration.
    ///
    /// Uses the configured path, falling back to common locations and `PATH`.
    pub async fn spawn_with_settings(settings: &Settings) -> WorkerResult<Self> {
        let worker_path = Self::resolve_worker_path(settings)?;
        Self::spawn(&worker_path, &settings.worker.args, settings.worker.timeout()).await
    }

    /// Resolve the worker binary path from settings.
    fn resolve_worker_path(settings: &Settings) -> WorkerResult<PathBuf> {
        match settings.worker_path() {
            Ok(Some(path)) => return Ok(path),
            Ok(None) => {}
            Err(e) => {
                return Err(WorkerError::SpawnFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    e.to_string(),
                )))
            }
        }

        let candidates = ["./podium-worker", "./worker/podium-worker"];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        if let Ok(output) = std::process::Command::new("which")
            .arg("podium-worker")
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(WorkerError::NotFound)
    }

    /// Spawn a worker process with arguments and a request timeout.
    pub async fn spawn<P: AsRef<Path>>(
        worker_path: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let mut child = Command::new(worker_path.as_ref())
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(WorkerError::SpawnFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "worker stdio not captured",
            )));
        };

        tracing::info!(
            path = %worker_path.as_ref().display(),
            pid = ?child.id(),
            "spawned analyst worker"
        );

        let stdin = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader_task = Self::spawn_reader_task(stdout, pending.clone());

        Ok(Self {
            stdin,
            pending,
            _child: child,
            reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the worker.
    fn spawn_reader_task(stdout: ChildStdout, pending: PendingMap) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let mut pending = pending.lock().await;
                            match pending.remove(&resp.id) {
                                Some(tx) => {
                                    let _ = tx.send(resp);
                                }
                                None => {
                                    tracing::debug!(id = %resp.id, "response for unknown request")
                                }
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to parse worker response"),
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "worker read error");
                        break;
                    }
                }
            }

            // Fail every request still waiting on the exited worker
            let mut pending = pending.lock().await;
            if !pending.is_empty() {
                tracing::warn!(pending = pending.len(), "worker exited with requests in flight");
            }
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: codes::WORKER_EXITED.to_string(),
                        message: "Worker process exited unexpectedly".to_string(),
                    }),
                });
            }
        })
    }

    /// Send a request to the worker and wait for a response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Serialization fails
    /// - Writing to the worker fails
    /// - The request times out
    /// - The worker returns an error response
    /// - Deserialization of the response fails
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        tracing::debug!(%id, method, "sending worker request");
        if let Err(e) = self.write_line(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => return Err(WorkerError::ChannelClosed),
            Err(_) => {
                // Drop the pending entry so a late response is discarded
                self.pending.lock().await.remove(&id);
                return Err(WorkerError::Timeout(self.timeout));
            }
        };

        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(WorkerError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: codes::UNKNOWN.to_string(),
                message: "Unknown error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    async fn write_line(&self, request: &RequestEnvelope) -> WorkerResult<()> {
        let line = serde_json::to_string(request).map_err(WorkerError::SerializeFailed)? + "\n";
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::WriteFailed)?;
        stdin.flush().await.map_err(WorkerError::WriteFailed)
    }

    /// Classify a worker error into a more specific error type.
    fn classify_error(code: &str, message: &str) -> WorkerError {
        match code {
            codes::INVALID_REQUEST => WorkerError::InvalidRequest(message.to_string()),
            codes::METHOD_NOT_FOUND => WorkerError::MethodNotFound(message.to_string()),
            codes::UPSTREAM_FAILED => WorkerError::Upstream(message.to_string()),
            codes::WORKER_EXITED => WorkerError::WorkerExited,
            _ => WorkerError::remote(code, message),
        }
    }

    /// Returns `false` once the reader task has finished, i.e. the worker exited.
    pub fn is_alive(&self) -> bool {
        !self.reader_task.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
