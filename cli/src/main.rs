//! chaincall CLI: batch read-only contract calls through a multicall aggregator.
//!
//! # Commands
//! ```text
//! chaincall aggregate    --call <name=target:data>... [--calls-file <path>]
//!                        [--require-success] [--balance-of <addr> | --with-block]
//! chaincall block-number
//! chaincall eth-balance  <address>
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use chaincall_core::{BlockTag, JsonRpcCaller, Multicaller, ResultMap};
use chaincall_http::{HttpClientConfig, HttpRpcClient};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

mod calls;
mod config;
mod logging;

use config::{CliConfig, Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "chaincall",
    about = "Batch read-only contract calls into a single eth_call",
    long_about = "
chaincall packs many read-only contract calls into one call to an on-chain
multicall aggregator and prints each call's success flag and return data.

ENVIRONMENT VARIABLES:
  CHAINCALL_RPC_URL     JSON-RPC endpoint URL
  CHAINCALL_CONTRACT    Aggregator contract address
",
    version
)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint URL
    #[arg(long, env = "CHAINCALL_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Aggregator contract address
    #[arg(long, env = "CHAINCALL_CONTRACT", global = true)]
    contract: Option<Address>,

    /// Block tag or number to execute against (latest, safe, finalized, 0x.., 123)
    #[arg(long, global = true)]
    block: Option<BlockTag>,

    /// Aggregator ABI JSON file (default: bundled)
    #[arg(long, global = true)]
    abi: Option<PathBuf>,

    /// HTTP request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log level filter, e.g. "debug" or "warn,chaincall_core=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of calls through tryAggregate
    Aggregate {
        /// A call as name=0xtarget:0xcalldata (repeatable)
        #[arg(long = "call", value_name = "NAME=TARGET:DATA")]
        calls: Vec<String>,
        /// JSON file with an array of {name, target, callData}
        #[arg(long)]
        calls_file: Option<PathBuf>,
        /// Revert the whole batch if any call fails
        #[arg(long)]
        require_success: bool,
        /// Also report the native balance of this address (tryAggregateBalances)
        #[arg(long, conflicts_with = "with_block")]
        balance_of: Option<Address>,
        /// Also report block number and hash (tryBlockAndAggregate)
        #[arg(long)]
        with_block: bool,
    },

    /// Print the current block number as seen by the aggregator
    #[command(name = "block-number")]
    BlockNumber,

    /// Print the native balance of an address via the aggregator
    #[command(name = "eth-balance")]
    EthBalance {
        /// Address to query
        address: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = CliConfig::load(cli.config.as_deref())?.resolve(Overrides {
        rpc_url: cli.rpc_url,
        contract: cli.contract,
        block: cli.block,
        abi_path: cli.abi,
        request_timeout_ms: cli.timeout_ms,
        log_level: cli.log_level,
        json_logs: cli.json_logs,
    })?;
    logging::init_tracing(&settings.log);

    let multicaller = build_multicaller(&settings)?;

    let output = match cli.command {
        Commands::Aggregate {
            calls: call_specs,
            calls_file,
            require_success,
            balance_of,
            with_block,
        } => {
            let mut batch = match calls_file {
                Some(path) => calls::load_calls_file(&path)?,
                None => Vec::new(),
            };
            for spec in &call_specs {
                batch.push(calls::parse_call_spec(spec)?);
            }
            let require_success = require_success || multicaller.require_success();
            tracing::info!(calls = batch.len(), require_success, "running batch");

            if let Some(user) = balance_of {
                let out = multicaller
                    .try_aggregate_balances(&batch, require_success, user)
                    .await?;
                json!({
                    "results": render_results(&out.results),
                    "nativeBalance": out.native_balance.to_string(),
                })
            } else if with_block {
                let out = multicaller
                    .try_block_and_aggregate(&batch, require_success)
                    .await?;
                json!({
                    "blockNumber": out.block_number,
                    "blockHash": out.block_hash,
                    "results": render_results(&out.results),
                })
            } else {
                let results = multicaller.try_aggregate(&batch, require_success).await?;
                render_results(&results)
            }
        }

        Commands::BlockNumber => json!({ "blockNumber": multicaller.block_number().await? }),

        Commands::EthBalance { address } => json!({
            "address": address,
            "balance": multicaller.eth_balance(address).await?.to_string(),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_multicaller(settings: &Settings) -> Result<Multicaller<JsonRpcCaller>> {
    let client = HttpRpcClient::new(
        settings.rpc_url.clone(),
        HttpClientConfig {
            request_timeout: settings.request_timeout,
        },
    )
    .with_context(|| format!("create HTTP client for '{}'", settings.rpc_url))?;

    let caller = JsonRpcCaller::new(Arc::new(client));
    Ok(Multicaller::from_config(caller, &settings.multicall).with_abi(settings.abi()?))
}

/// Results keyed by name, sorted for stable output.
fn render_results(results: &ResultMap) -> Value {
    let sorted: BTreeMap<_, _> = results.iter().collect();
    json!(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincall_core::CallResult;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_aggregate_flags() {
        let cli = Cli::try_parse_from([
            "chaincall",
            "--rpc-url",
            "http://localhost:8545",
            "--block",
            "finalized",
            "aggregate",
            "--call",
            "a=0x0000000000000000000000000000000000000001:0x01",
            "--call",
            "b=0x0000000000000000000000000000000000000002:0x",
            "--require-success",
        ])
        .unwrap();
        assert_eq!(cli.block, Some(BlockTag::Finalized));
        match cli.command {
            Commands::Aggregate {
                calls,
                require_success,
                balance_of,
                with_block,
                ..
            } => {
                assert_eq!(calls.len(), 2);
                assert!(require_success);
                assert!(balance_of.is_none());
                assert!(!with_block);
            }
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn balance_and_block_variants_conflict() {
        let parsed = Cli::try_parse_from([
            "chaincall",
            "aggregate",
            "--balance-of",
            "0x0000000000000000000000000000000000000001",
            "--with-block",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn results_render_sorted_with_hex_data() {
        let mut results = ResultMap::new();
        results.insert("b".into(), CallResult::new(false, Vec::new()));
        results.insert("a".into(), CallResult::new(true, vec![0x2a]));
        let rendered = render_results(&results);
        assert_eq!(
            rendered,
            json!({
                "a": { "success": true, "returnData": "0x2a" },
                "b": { "success": false, "returnData": "0x" },
            })
        );
        let names: Vec<&String> = rendered.as_object().unwrap().keys().collect();
        assert_eq!(names, ["a", "b"]);
    }
}
