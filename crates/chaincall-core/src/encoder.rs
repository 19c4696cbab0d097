//! Call encoder: packs named calls into aggregator calldata.
//!
//! Calldata is `selector ++ abi_encode_params(args...)`. Targets and payloads
//! are not inspected; a malformed payload only shows up later as a
//! `success == false` entry in the decoded results.

use alloy_core::dyn_abi::DynSolValue;
use alloy_dyn_abi::Specifier;
use alloy_primitives::{Address, Bytes};

use crate::abi::{
    AggregatorAbi, GET_BLOCK_NUMBER, GET_ETH_BALANCE, TRY_AGGREGATE, TRY_AGGREGATE_BALANCES,
    TRY_BLOCK_AND_AGGREGATE,
};
use crate::error::MulticallError;
use crate::types::Call;

/// Encode `tryAggregate(requireSuccess, calls)`.
///
/// An empty `calls` slice encodes to a valid, empty batch.
pub fn encode_aggregate(
    abi: &AggregatorAbi,
    calls: &[Call],
    require_success: bool,
) -> Result<Bytes, MulticallError> {
    encode_function(
        abi,
        TRY_AGGREGATE,
        vec![DynSolValue::Bool(require_success), calls_value(calls)],
    )
}

/// Encode `tryAggregateBalances(requireSuccess, calls, balanceAddress)`.
pub fn encode_aggregate_with_balance(
    abi: &AggregatorAbi,
    calls: &[Call],
    require_success: bool,
    balance_address: Address,
) -> Result<Bytes, MulticallError> {
    encode_function(
        abi,
        TRY_AGGREGATE_BALANCES,
        vec![
            DynSolValue::Bool(require_success),
            calls_value(calls),
            DynSolValue::Address(balance_address),
        ],
    )
}

/// Encode `tryBlockAndAggregate(requireSuccess, calls)`.
pub fn encode_block_and_aggregate(
    abi: &AggregatorAbi,
    calls: &[Call],
    require_success: bool,
) -> Result<Bytes, MulticallError> {
    encode_function(
        abi,
        TRY_BLOCK_AND_AGGREGATE,
        vec![DynSolValue::Bool(require_success), calls_value(calls)],
    )
}

/// Encode `getEthBalance(addr)`.
pub fn encode_eth_balance(abi: &AggregatorAbi, addr: Address) -> Result<Bytes, MulticallError> {
    encode_function(abi, GET_ETH_BALANCE, vec![DynSolValue::Address(addr)])
}

/// Encode `getBlockNumber()`.
pub fn encode_block_number(abi: &AggregatorAbi) -> Result<Bytes, MulticallError> {
    encode_function(abi, GET_BLOCK_NUMBER, vec![])
}

/// Encode a call to any function in the aggregator schema.
///
/// # Errors
/// `MulticallError::Encoding` when the function is missing from the schema,
/// the argument count differs from the declared inputs, or an argument does
/// not match its declared type.
pub fn encode_function(
    abi: &AggregatorAbi,
    function_name: &str,
    args: Vec<DynSolValue>,
) -> Result<Bytes, MulticallError> {
    let func = abi
        .function(function_name)
        .ok_or_else(|| MulticallError::encoding(function_name, abi.missing_function(function_name)))?;

    if args.len() != func.inputs.len() {
        return Err(MulticallError::encoding(
            function_name,
            format!(
                "argument count mismatch: ABI has {}, got {}",
                func.inputs.len(),
                args.len()
            ),
        ));
    }

    for (i, (param, arg)) in func.inputs.iter().zip(args.iter()).enumerate() {
        let ty = param
            .resolve()
            .map_err(|e| MulticallError::encoding(function_name, format!("param {i}: {e}")))?;
        if !ty.matches(arg) {
            return Err(MulticallError::encoding(
                function_name,
                format!(
                    "param {i} ('{}') does not match ABI type {}",
                    param.name,
                    ty.sol_type_name()
                ),
            ));
        }
    }

    let mut calldata = func.selector().to_vec();
    calldata.extend_from_slice(&DynSolValue::Tuple(args).abi_encode_params());
    Ok(calldata.into())
}

/// `(address,bytes)[]` value for a call list, in input order.
fn calls_value(calls: &[Call]) -> DynSolValue {
    DynSolValue::Array(
        calls
            .iter()
            .map(|call| {
                DynSolValue::Tuple(vec![
                    DynSolValue::Address(call.target),
                    DynSolValue::Bytes(call.call_data.to_vec()),
                ])
            })
            .collect(),
    )
}
