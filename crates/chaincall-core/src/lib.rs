//! chaincall-core: batch many read-only contract calls into one `eth_call`.
//!
//! # Overview
//!
//! Named calls are packed into a single invocation of an on-chain
//! aggregator (a Multicall2 derivative). The aggregator runs each sub-call,
//! captures success and return bytes, and the response is decoded back into
//! a map keyed by the caller's names.
//!
//! - [`Multicaller`]: the batch facade (plain, balance and block variants)
//! - [`EthCaller`]: the read-only call capability; [`JsonRpcCaller`] adapts
//!   any [`RpcTransport`]
//! - [`encoder`] / [`decoder`]: schema-driven calldata and response handling
//! - [`revert`]: `Error(string)` / `Panic(uint256)` reason decoding
//! - [`MulticallError`] / [`TransportError`]: structured errors

pub mod abi;
pub mod block;
pub mod caller;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod multicall;
pub mod request;
pub mod revert;
pub mod transport;
pub mod types;

pub use abi::AggregatorAbi;
pub use block::BlockTag;
pub use caller::{EthCaller, JsonRpcCaller};
pub use config::MulticallConfig;
pub use decoder::LeadingEntries;
pub use error::{MulticallError, TransportError};
pub use multicall::Multicaller;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
pub use types::{BalancesOutcome, BlockAggregate, Call, CallResult, ResultMap};
