//! Request and result types for a single batch.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// One read-only call inside a batch.
///
/// `call_data` is the already ABI-encoded selector + arguments for `target`.
/// Names are opaque keys chosen by the caller; uniqueness is not enforced and
/// a later duplicate overwrites an earlier one in the [`ResultMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub target: Address,
    #[serde(alias = "callData")]
    pub call_data: Bytes,
}

impl Call {
    pub fn new(name: impl Into<String>, target: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            target,
            call_data: call_data.into(),
        }
    }
}

/// Outcome of one sub-call as reported by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    #[serde(rename = "returnData")]
    pub return_data: Bytes,
}

impl CallResult {
    pub fn new(success: bool, return_data: impl Into<Bytes>) -> Self {
        Self {
            success,
            return_data: return_data.into(),
        }
    }

    /// A failed sub-call that returned nothing, e.g. a target without code.
    pub fn is_empty(&self) -> bool {
        !self.success && self.return_data.is_empty()
    }
}

/// Call name → result, built fresh for every batch.
pub type ResultMap = HashMap<String, CallResult>;

/// Result of `tryAggregateBalances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesOutcome {
    pub results: ResultMap,
    /// Native-token balance of the queried address at the executed block.
    pub native_balance: U256,
}

/// Result of `tryBlockAndAggregate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAggregate {
    pub block_number: u64,
    pub block_hash: B256,
    pub results: ResultMap,
}
