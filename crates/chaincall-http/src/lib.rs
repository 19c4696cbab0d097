//! chaincall-http: `reqwest`-backed JSON-RPC transport for chaincall.

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
