//! Revert detection and reason decoding for failed `eth_call`s.
//!
//! Nodes report a reverted call as a JSON-RPC error. Geth-style nodes use
//! code `3` and put the revert payload in `error.data`; others use `-32000`
//! with an "execution reverted" message. The payload, when present, is one of
//! - `0x08c379a0` ++ abi(string)  → `Error(string)` from `require`/`revert`
//! - `0x4e487b71` ++ abi(uint256) → `Panic(uint256)` from Solidity >= 0.8
//! - anything else (custom errors, empty)

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;
use serde_json::Value;

use crate::error::MulticallError;
use crate::request::JsonRpcError;

/// The 4-byte selector for `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// The 4-byte selector for `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

const EXECUTION_REVERTED_CODE: i64 = 3;

/// A reverted call extracted from a node error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub reason: Option<String>,
    pub data: Bytes,
}

impl From<Revert> for MulticallError {
    fn from(revert: Revert) -> Self {
        MulticallError::ContractRevert {
            reason: revert.reason,
            data: revert.data,
        }
    }
}

/// Classify a JSON-RPC error; `None` if it is not an execution revert.
pub fn revert_from_rpc(err: &JsonRpcError) -> Option<Revert> {
    let is_revert =
        err.code == EXECUTION_REVERTED_CODE || err.message.to_ascii_lowercase().contains("revert");
    if !is_revert {
        return None;
    }

    let data = err.data.as_ref().and_then(revert_payload).unwrap_or_default();
    let reason = decode_revert_reason(&data).or_else(|| message_reason(&err.message));
    Some(Revert { reason, data })
}

/// Human-readable reason for a revert payload, if it uses a standard encoding.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if let Some(message) = decode_error_string(data) {
        return Some(message);
    }
    decode_panic(data).map(|(code, meaning)| format!("panic {code:#x}: {meaning}"))
}

/// Decode an `Error(string)` payload.
pub fn decode_error_string(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(&ERROR_STRING_SELECTOR)?;
    match DynSolType::String.abi_decode(payload) {
        Ok(DynSolValue::String(s)) => Some(s),
        _ => None,
    }
}

/// Decode a `Panic(uint256)` payload into `(code, meaning)`.
pub fn decode_panic(data: &[u8]) -> Option<(u64, &'static str)> {
    let payload = data.strip_prefix(&PANIC_SELECTOR)?;
    match DynSolType::Uint(256).abi_decode(payload) {
        Ok(DynSolValue::Uint(v, _)) => {
            let code = u64::try_from(v).ok()?;
            Some((code, panic_meaning(code)))
        }
        _ => None,
    }
}

/// Map a Solidity panic code to a short description.
pub fn panic_meaning(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler-inserted panic",
        0x01 => "assert() called with false condition",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "corrupted storage byte array",
        0x31 => ".pop() on empty array",
        0x32 => "out-of-bounds array access",
        0x41 => "too much memory allocated",
        0x51 => "called zero-initialized internal function pointer",
        _ => "unknown panic code",
    }
}

/// `error.data` is a hex string on most nodes and `{ "data": "0x.." }` on some.
fn revert_payload(value: &Value) -> Option<Bytes> {
    let hex_str = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    hex::decode(hex_str.trim_start_matches("0x")).ok().map(Bytes::from)
}

fn message_reason(message: &str) -> Option<String> {
    let (_, reason) = message.split_once(':')?;
    let reason = reason.trim();
    (!reason.is_empty()).then(|| reason.to_string())
}
