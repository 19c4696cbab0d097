//! Result decoder and correlator.
//!
//! Aggregator responses are decoded against the declared output schema and
//! matched structurally into [`CallResult`]s. Correlation with call names is
//! positional: result `i` belongs to call `i` of the same input slice.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::abi::{AggregatorAbi, TRY_AGGREGATE, TRY_AGGREGATE_BALANCES, TRY_BLOCK_AND_AGGREGATE};
use crate::error::MulticallError;
use crate::types::{Call, CallResult, ResultMap};

/// How to treat surplus entries at the front of a decoded result list.
///
/// Some node/aggregator combinations have been seen returning extra empty
/// entries ahead of the real results. Adjusting policies only ever drop
/// entries that are empty (`success == false`, no return data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadingEntries {
    /// The response must contain exactly one entry per call.
    #[default]
    Strict,
    /// The response must contain exactly `n` extra leading entries.
    Skip(usize),
    /// Drop up to `max` surplus leading entries when present.
    Detect { max: usize },
}

/// Decode a `tryAggregate` response into `expected` results.
pub fn decode_aggregate(
    abi: &AggregatorAbi,
    data: &[u8],
    expected: usize,
    leading: LeadingEntries,
) -> Result<Vec<CallResult>, MulticallError> {
    let [results] = decode_outputs::<1>(abi, TRY_AGGREGATE, data)?;
    let results = call_results(TRY_AGGREGATE, results)?;
    apply_leading_entries(TRY_AGGREGATE, results, expected, leading)
}

/// Decode a `tryAggregateBalances` response into `expected` results plus the
/// trailing native balance.
pub fn decode_aggregate_with_balance(
    abi: &AggregatorAbi,
    data: &[u8],
    expected: usize,
    leading: LeadingEntries,
) -> Result<(Vec<CallResult>, U256), MulticallError> {
    let [results, balance] = decode_outputs::<2>(abi, TRY_AGGREGATE_BALANCES, data)?;
    let results = call_results(TRY_AGGREGATE_BALANCES, results)?;
    let results = apply_leading_entries(TRY_AGGREGATE_BALANCES, results, expected, leading)?;
    let balance = uint(TRY_AGGREGATE_BALANCES, balance)?;
    Ok((results, balance))
}

/// Decode a `tryBlockAndAggregate` response into block number, block hash and
/// `expected` results.
pub fn decode_block_and_aggregate(
    abi: &AggregatorAbi,
    data: &[u8],
    expected: usize,
    leading: LeadingEntries,
) -> Result<(u64, B256, Vec<CallResult>), MulticallError> {
    let [number, hash, results] = decode_outputs::<3>(abi, TRY_BLOCK_AND_AGGREGATE, data)?;
    let number = uint(TRY_BLOCK_AND_AGGREGATE, number)?;
    let number = u64::try_from(number).map_err(|_| {
        MulticallError::decoding(TRY_BLOCK_AND_AGGREGATE, format!("block number {number} exceeds u64"))
    })?;
    let hash = match hash {
        DynSolValue::FixedBytes(word, 32) => word,
        other => {
            return Err(MulticallError::decoding(
                TRY_BLOCK_AND_AGGREGATE,
                format!("expected bytes32 block hash, got {other:?}"),
            ))
        }
    };
    let results = call_results(TRY_BLOCK_AND_AGGREGATE, results)?;
    let results = apply_leading_entries(TRY_BLOCK_AND_AGGREGATE, results, expected, leading)?;
    Ok((number, hash, results))
}

/// Decode a function whose single output is a `uint256`.
pub fn decode_uint(
    abi: &AggregatorAbi,
    function_name: &str,
    data: &[u8],
) -> Result<U256, MulticallError> {
    let [value] = decode_outputs::<1>(abi, function_name, data)?;
    uint(function_name, value)
}

/// Zip decoded results with the calls that produced them.
///
/// `calls` must be the same slice, in the same order, that was encoded.
/// A length mismatch is a protocol inconsistency and is never mapped.
pub fn correlate(results: Vec<CallResult>, calls: &[Call]) -> Result<ResultMap, MulticallError> {
    if results.len() != calls.len() {
        return Err(MulticallError::decoding(
            "correlate",
            format!("{} results for {} calls", results.len(), calls.len()),
        ));
    }
    let mut map = ResultMap::with_capacity(calls.len());
    for (call, result) in calls.iter().zip(results) {
        map.insert(call.name.clone(), result);
    }
    Ok(map)
}

/// Enforce the leading-entry policy and the one-result-per-call invariant.
pub fn apply_leading_entries(
    function_name: &str,
    mut results: Vec<CallResult>,
    expected: usize,
    policy: LeadingEntries,
) -> Result<Vec<CallResult>, MulticallError> {
    let got = results.len();
    let surplus = match policy {
        LeadingEntries::Strict => 0,
        LeadingEntries::Skip(n) if expected.checked_add(n) == Some(got) => n,
        LeadingEntries::Skip(n) => {
            return Err(MulticallError::decoding(
                function_name,
                format!("expected {expected} results plus {n} leading entries, got {got}"),
            ))
        }
        LeadingEntries::Detect { max } if got > expected && got - expected <= max => got - expected,
        LeadingEntries::Detect { .. } => 0,
    };

    if surplus > 0 {
        if let Some(pos) = results[..surplus].iter().position(|r| !r.is_empty()) {
            return Err(MulticallError::decoding(
                function_name,
                format!("leading entry {pos} is not empty; refusing to drop it"),
            ));
        }
        warn!(
            function = function_name,
            dropped = surplus,
            expected,
            "dropping empty leading entries from aggregator response"
        );
        results.drain(..surplus);
    }

    if results.len() != expected {
        return Err(MulticallError::decoding(
            function_name,
            format!("expected {expected} results, got {}", results.len()),
        ));
    }
    Ok(results)
}

/// ABI-decode the output tuple of `function_name`, requiring exactly `N` values.
fn decode_outputs<const N: usize>(
    abi: &AggregatorAbi,
    function_name: &str,
    data: &[u8],
) -> Result<[DynSolValue; N], MulticallError> {
    let func = abi
        .function(function_name)
        .ok_or_else(|| MulticallError::decoding(function_name, abi.missing_function(function_name)))?;

    if data.is_empty() {
        return Err(MulticallError::decoding(
            function_name,
            "empty response; is the aggregator deployed at this address?",
        ));
    }

    let types = func
        .outputs
        .iter()
        .map(|p| p.resolve())
        .collect::<Result<Vec<DynSolType>, _>>()
        .map_err(|e| MulticallError::decoding(function_name, format!("output type: {e}")))?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_sequence(data)
        .map_err(|e| MulticallError::decoding(function_name, e.to_string()))?;

    let values = match decoded {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    };
    let count = values.len();
    values.try_into().map_err(|_| {
        MulticallError::decoding(
            function_name,
            format!("schema declares {count} outputs, expected {N}"),
        )
    })
}

/// `(bool,bytes)[]` → results, in response order.
fn call_results(function_name: &str, value: DynSolValue) -> Result<Vec<CallResult>, MulticallError> {
    let items = match value {
        DynSolValue::Array(items) => items,
        other => {
            return Err(MulticallError::decoding(
                function_name,
                format!("expected (bool,bytes)[] results, got {other:?}"),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            DynSolValue::Tuple(fields) => match <[DynSolValue; 2]>::try_from(fields) {
                Ok([DynSolValue::Bool(success), DynSolValue::Bytes(data)]) => {
                    Ok(CallResult::new(success, data))
                }
                _ => Err(MulticallError::decoding(
                    function_name,
                    format!("result {i} is not a (bool,bytes) tuple"),
                )),
            },
            other => Err(MulticallError::decoding(
                function_name,
                format!("result {i} is not a tuple: {other:?}"),
            )),
        })
        .collect()
}

fn uint(function_name: &str, value: DynSolValue) -> Result<U256, MulticallError> {
    match value {
        DynSolValue::Uint(v, _) => Ok(v),
        other => Err(MulticallError::decoding(
            function_name,
            format!("expected uint256, got {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn word(hex_str: &str) -> String {
        format!("{hex_str:0>64}")
    }

    fn calls(names: &[&str]) -> Vec<Call> {
        names
            .iter()
            .map(|n| Call::new(*n, Address::ZERO, Vec::new()))
            .collect()
    }

    /// Hand-assembled `tryAggregate` return: one successful result carrying
    /// a single 32-byte word (uint256 = 1000).
    fn one_result_response() -> Vec<u8> {
        let hex_str = [
            word("20"),  // offset of returnData
            word("1"),   // returnData.length
            word("20"),  // offset of returnData[0]
            word("1"),   // success
            word("40"),  // offset of bytes within the tuple
            word("20"),  // bytes.length
            word("3e8"), // bytes = uint256(1000)
        ]
        .concat();
        hex::decode(hex_str).unwrap()
    }

    #[test]
    fn decode_hand_assembled_response() {
        let abi = AggregatorAbi::bundled();
        let results =
            decode_aggregate(&abi, &one_result_response(), 1, LeadingEntries::Strict).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(U256::from_be_slice(&results[0].return_data), U256::from(1000));
    }

    #[test]
    fn decode_empty_result_list() {
        let abi = AggregatorAbi::bundled();
        let data = hex::decode([word("20"), word("0")].concat()).unwrap();
        let results = decode_aggregate(&abi, &data, 0, LeadingEntries::Strict).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn count_mismatch_is_a_decoding_error() {
        let abi = AggregatorAbi::bundled();
        let err = decode_aggregate(&abi, &one_result_response(), 2, LeadingEntries::Strict)
            .unwrap_err();
        assert!(matches!(err, MulticallError::Decoding { .. }));
    }

    #[test]
    fn empty_response_is_a_decoding_error() {
        let abi = AggregatorAbi::bundled();
        let err = decode_aggregate(&abi, &[], 0, LeadingEntries::Strict).unwrap_err();
        match err {
            MulticallError::Decoding { reason, .. } => assert!(reason.contains("empty response")),
            other => panic!("expected Decoding, got {other:?}"),
        }
    }

    #[test]
    fn truncated_response_is_a_decoding_error() {
        let abi = AggregatorAbi::bundled();
        let data = one_result_response();
        let err = decode_aggregate(&abi, &data[..70], 1, LeadingEntries::Strict).unwrap_err();
        assert!(matches!(err, MulticallError::Decoding { .. }));
    }

    #[test]
    fn decode_balance_variant() {
        let abi = AggregatorAbi::bundled();
        let hex_str = [
            word("40"),              // offset of returnData
            word("de0b6b3a7640000"), // userNativeBalance = 1 ether
            word("0"),               // returnData.length
        ]
        .concat();
        let data = hex::decode(hex_str).unwrap();
        let (results, balance) =
            decode_aggregate_with_balance(&abi, &data, 0, LeadingEntries::Strict).unwrap();
        assert!(results.is_empty());
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn decode_block_variant() {
        let abi = AggregatorAbi::bundled();
        let hash = "ab".repeat(32);
        let hex_str = [word("10"), hash.clone(), word("60"), word("0")].concat();
        let data = hex::decode(hex_str).unwrap();
        let (number, block_hash, results) =
            decode_block_and_aggregate(&abi, &data, 0, LeadingEntries::Strict).unwrap();
        assert_eq!(number, 16);
        assert_eq!(hex::encode(block_hash), hash);
        assert!(results.is_empty());
    }

    #[test]
    fn correlate_is_positional() {
        let results = vec![CallResult::new(true, vec![1]), CallResult::new(false, vec![2])];
        let map = correlate(results, &calls(&["first", "second"])).unwrap();
        assert_eq!(map["first"], CallResult::new(true, vec![1]));
        assert_eq!(map["second"], CallResult::new(false, vec![2]));
    }

    #[test]
    fn correlate_rejects_length_mismatch() {
        let err = correlate(vec![CallResult::default()], &calls(&["a", "b"])).unwrap_err();
        assert!(matches!(err, MulticallError::Decoding { .. }));
    }

    #[test]
    fn strict_rejects_surplus_entries() {
        let results = vec![CallResult::default(), CallResult::new(true, vec![1])];
        let err = apply_leading_entries("t", results, 1, LeadingEntries::Strict).unwrap_err();
        assert!(matches!(err, MulticallError::Decoding { .. }));
    }

    #[test]
    fn skip_drops_exactly_n_empty_entries() {
        let results = vec![
            CallResult::default(),
            CallResult::default(),
            CallResult::new(true, vec![7]),
        ];
        let kept = apply_leading_entries("t", results, 1, LeadingEntries::Skip(2)).unwrap();
        assert_eq!(kept, vec![CallResult::new(true, vec![7])]);

        let results = vec![CallResult::new(true, vec![7])];
        assert!(apply_leading_entries("t", results, 1, LeadingEntries::Skip(2)).is_err());
    }

    #[test]
    fn oversized_skip_is_a_decoding_error() {
        let err = apply_leading_entries(
            "t",
            vec![CallResult::default()],
            1,
            LeadingEntries::Skip(usize::MAX),
        )
        .unwrap_err();
        assert!(matches!(err, MulticallError::Decoding { .. }));
    }

    #[test]
    fn detect_is_a_no_op_without_surplus() {
        let results = vec![CallResult::default()];
        let kept =
            apply_leading_entries("t", results.clone(), 1, LeadingEntries::Detect { max: 2 })
                .unwrap();
        assert_eq!(kept, results);
    }

    #[test]
    fn detect_drops_empty_surplus_up_to_max() {
        let results = vec![
            CallResult::default(),
            CallResult::default(),
            CallResult::new(true, vec![7]),
        ];
        let kept =
            apply_leading_entries("t", results.clone(), 1, LeadingEntries::Detect { max: 2 })
                .unwrap();
        assert_eq!(kept.len(), 1);

        assert!(apply_leading_entries("t", results, 1, LeadingEntries::Detect { max: 1 }).is_err());
    }

    #[test]
    fn adjusting_policies_never_drop_real_results() {
        let results = vec![CallResult::new(true, vec![9]), CallResult::new(true, vec![7])];
        let err =
            apply_leading_entries("t", results, 1, LeadingEntries::Detect { max: 2 }).unwrap_err();
        match err {
            MulticallError::Decoding { reason, .. } => assert!(reason.contains("not empty")),
            other => panic!("expected Decoding, got {other:?}"),
        }
    }

    #[test]
    fn leading_entries_serde_forms() {
        let strict: LeadingEntries = serde_json::from_str("\"strict\"").unwrap();
        let skip: LeadingEntries = serde_json::from_str(r#"{"skip":2}"#).unwrap();
        let detect: LeadingEntries = serde_json::from_str(r#"{"detect":{"max":2}}"#).unwrap();
        assert_eq!(strict, LeadingEntries::Strict);
        assert_eq!(skip, LeadingEntries::Skip(2));
        assert_eq!(detect, LeadingEntries::Detect { max: 2 });
    }
}
