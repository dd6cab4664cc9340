//! Worker communication module.
//!
//! Query interpretation, data fetching and analysis code synthesis and
//! execution live in an analyst worker process. This module talks to it and
//! exposes it as the pipeline's async collaborators.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    podium (Rust + Tokio)                        │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  Analyzer ──► WorkerBackend ──► WorkerClient (async)      │  │
//! │  │  - Spawns the worker as a child process                   │  │
//! │  │  - NDJSON protocol over stdin/stdout                      │  │
//! │  │  - Request IDs for concurrent request correlation         │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │               stdin (NDJSON) │ stdout (NDJSON)                  │
//! └──────────────────────────────┼──────────────────────────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Analyst worker: query.interpret, data.fetch,                   │
//! │                  code.generate, code.execute                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod client;
mod error;
pub mod protocol;

pub use backend::{extract_code_block, WorkerBackend};
pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
