//! HTTP transport for the analysis API.
//!
//! Routes:
//!
//! ```text
//! POST /api/v1/analyze          {"query": "..."} -> analysis response
//! GET  /api/v1/history?limit=N  most recent requests, newest first
//! GET  /api/health              liveness
//! ```

#[cfg(feature = "server")]
mod server;

#[cfg(feature = "server")]
pub use server::*;
