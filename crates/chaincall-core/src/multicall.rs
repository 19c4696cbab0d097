//! `Multicaller`: encode → invoke → decode → correlate against one aggregator.

use std::time::Instant;

use alloy_primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::abi::{
    AggregatorAbi, GET_BLOCK_NUMBER, GET_ETH_BALANCE, TRY_AGGREGATE, TRY_AGGREGATE_BALANCES,
    TRY_BLOCK_AND_AGGREGATE,
};
use crate::block::BlockTag;
use crate::caller::EthCaller;
use crate::config::MulticallConfig;
use crate::decoder::{
    correlate, decode_aggregate, decode_aggregate_with_balance, decode_block_and_aggregate,
    decode_uint, LeadingEntries,
};
use crate::encoder::{
    encode_aggregate, encode_aggregate_with_balance, encode_block_and_aggregate,
    encode_block_number, encode_eth_balance,
};
use crate::error::{MulticallError, TransportError};
use crate::revert::revert_from_rpc;
use crate::types::{BalancesOutcome, BlockAggregate, Call, ResultMap};

/// Batches read-only calls through a deployed aggregator contract.
///
/// Each operation is exactly one `eth_call`. The result map of a batch is
/// built fresh and owned by the caller; nothing is cached between batches.
#[derive(Clone)]
pub struct Multicaller<C> {
    caller: C,
    contract: Address,
    abi: AggregatorAbi,
    block: BlockTag,
    leading: LeadingEntries,
    require_success: bool,
}

impl<C: EthCaller> Multicaller<C> {
    /// Aggregator at `contract`, bundled ABI, `latest` block, strict decoding,
    /// sub-call failures reported per entry.
    pub fn new(caller: C, contract: Address) -> Self {
        Self {
            caller,
            contract,
            abi: AggregatorAbi::bundled(),
            block: BlockTag::Latest,
            leading: LeadingEntries::Strict,
            require_success: false,
        }
    }

    pub fn from_config(caller: C, config: &MulticallConfig) -> Self {
        Self::new(caller, config.contract)
            .with_block(config.block)
            .with_leading_entries(config.leading_entries)
            .with_require_success(config.require_success)
    }

    pub fn with_abi(mut self, abi: AggregatorAbi) -> Self {
        self.abi = abi;
        self
    }

    pub fn with_block(mut self, block: BlockTag) -> Self {
        self.block = block;
        self
    }

    pub fn with_leading_entries(mut self, leading: LeadingEntries) -> Self {
        self.leading = leading;
        self
    }

    /// Default `requireSuccess` for [`execute`](Self::execute) and
    /// [`execute_balances`](Self::execute_balances).
    pub fn with_require_success(mut self, require_success: bool) -> Self {
        self.require_success = require_success;
        self
    }

    pub fn require_success(&self) -> bool {
        self.require_success
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn block(&self) -> BlockTag {
        self.block
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    /// Run `calls` with the configured `requireSuccess` (default `false`).
    pub async fn execute(&self, calls: &[Call]) -> Result<ResultMap, MulticallError> {
        self.try_aggregate(calls, self.require_success).await
    }

    /// Run `calls` through `tryAggregate`.
    ///
    /// An empty slice returns an empty map without touching the network.
    /// With `require_success` any failing sub-call reverts the whole batch,
    /// surfaced as `MulticallError::ContractRevert`.
    pub async fn try_aggregate(
        &self,
        calls: &[Call],
        require_success: bool,
    ) -> Result<ResultMap, MulticallError> {
        if calls.is_empty() {
            return Ok(ResultMap::new());
        }
        let payload = encode_aggregate(&self.abi, calls, require_success)?;
        let raw = self.invoke(TRY_AGGREGATE, payload).await?;
        let results = decode_aggregate(&self.abi, &raw, calls.len(), self.leading)?;
        correlate(results, calls)
    }

    /// Run `calls` with the configured `requireSuccess` and read `user`'s
    /// native balance.
    pub async fn execute_balances(
        &self,
        calls: &[Call],
        user: Address,
    ) -> Result<BalancesOutcome, MulticallError> {
        self.try_aggregate_balances(calls, self.require_success, user).await
    }

    /// Run `calls` through `tryAggregateBalances`.
    ///
    /// Always invoked, even for an empty slice, since the balance is still
    /// meaningful.
    pub async fn try_aggregate_balances(
        &self,
        calls: &[Call],
        require_success: bool,
        user: Address,
    ) -> Result<BalancesOutcome, MulticallError> {
        let payload = encode_aggregate_with_balance(&self.abi, calls, require_success, user)?;
        let raw = self.invoke(TRY_AGGREGATE_BALANCES, payload).await?;
        let (results, native_balance) =
            decode_aggregate_with_balance(&self.abi, &raw, calls.len(), self.leading)?;
        Ok(BalancesOutcome {
            results: correlate(results, calls)?,
            native_balance,
        })
    }

    /// Run `calls` through `tryBlockAndAggregate`.
    pub async fn try_block_and_aggregate(
        &self,
        calls: &[Call],
        require_success: bool,
    ) -> Result<BlockAggregate, MulticallError> {
        let payload = encode_block_and_aggregate(&self.abi, calls, require_success)?;
        let raw = self.invoke(TRY_BLOCK_AND_AGGREGATE, payload).await?;
        let (block_number, block_hash, results) =
            decode_block_and_aggregate(&self.abi, &raw, calls.len(), self.leading)?;
        Ok(BlockAggregate {
            block_number,
            block_hash,
            results: correlate(results, calls)?,
        })
    }

    /// Native balance of `addr` via the aggregator's `getEthBalance`.
    pub async fn eth_balance(&self, addr: Address) -> Result<U256, MulticallError> {
        let payload = encode_eth_balance(&self.abi, addr)?;
        let raw = self.invoke(GET_ETH_BALANCE, payload).await?;
        decode_uint(&self.abi, GET_ETH_BALANCE, &raw)
    }

    /// Current block number as seen by the aggregator.
    pub async fn block_number(&self) -> Result<u64, MulticallError> {
        let payload = encode_block_number(&self.abi)?;
        let raw = self.invoke(GET_BLOCK_NUMBER, payload).await?;
        let number = decode_uint(&self.abi, GET_BLOCK_NUMBER, &raw)?;
        u64::try_from(number).map_err(|_| {
            MulticallError::decoding(GET_BLOCK_NUMBER, format!("block number {number} exceeds u64"))
        })
    }

    /// Submit one encoded payload to the aggregator as an `eth_call`.
    ///
    /// Node errors that signal execution reversion become
    /// `MulticallError::ContractRevert`; everything else stays a transport error.
    pub async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, MulticallError> {
        let started = Instant::now();
        let payload_bytes = payload.len();

        match self.caller.eth_call(self.contract, payload, self.block).await {
            Ok(raw) => {
                debug!(
                    function,
                    contract = %self.contract,
                    block = %self.block,
                    payload_bytes,
                    response_bytes = raw.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "aggregator call complete"
                );
                Ok(raw)
            }
            Err(TransportError::Rpc(err)) => match revert_from_rpc(&err) {
                Some(revert) => {
                    debug!(
                        function,
                        contract = %self.contract,
                        reason = revert.reason.as_deref().unwrap_or(""),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "aggregator call reverted"
                    );
                    Err(revert.into())
                }
                None => Err(TransportError::Rpc(err).into()),
            },
            Err(e) => {
                debug!(function, contract = %self.contract, error = %e, "aggregator call failed");
                Err(e.into())
            }
        }
    }
}
