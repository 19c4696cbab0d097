//! Aggregator contract schema.
//!
//! The aggregator is a Multicall2 derivative with one extra entry point,
//! `tryAggregateBalances`, that also reports the native balance of a supplied
//! address. The schema is treated as external input: a bundled copy is used
//! by default and a different ABI document can be loaded with
//! [`AggregatorAbi::from_json`].

use alloy_json_abi::{Function, JsonAbi};

use crate::error::MulticallError;

pub const TRY_AGGREGATE: &str = "tryAggregate";
pub const TRY_AGGREGATE_BALANCES: &str = "tryAggregateBalances";
pub const TRY_BLOCK_AND_AGGREGATE: &str = "tryBlockAndAggregate";
pub const GET_ETH_BALANCE: &str = "getEthBalance";
pub const GET_BLOCK_NUMBER: &str = "getBlockNumber";

/// Bundled aggregator ABI.
pub const BUNDLED_ABI: &str = r#"[
    {
        "type": "function",
        "name": "tryAggregate",
        "stateMutability": "nonpayable",
        "inputs": [
            {"name": "requireSuccess", "type": "bool", "internalType": "bool"},
            {
                "name": "calls", "type": "tuple[]", "internalType": "struct CustomMulticall2.Call[]",
                "components": [
                    {"name": "target", "type": "address", "internalType": "address"},
                    {"name": "callData", "type": "bytes", "internalType": "bytes"}
                ]
            }
        ],
        "outputs": [
            {
                "name": "returnData", "type": "tuple[]", "internalType": "struct CustomMulticall2.Result[]",
                "components": [
                    {"name": "success", "type": "bool", "internalType": "bool"},
                    {"name": "returnData", "type": "bytes", "internalType": "bytes"}
                ]
            }
        ]
    },
    {
        "type": "function",
        "name": "tryAggregateBalances",
        "stateMutability": "nonpayable",
        "inputs": [
            {"name": "requireSuccess", "type": "bool", "internalType": "bool"},
            {
                "name": "calls", "type": "tuple[]", "internalType": "struct CustomMulticall2.Call[]",
                "components": [
                    {"name": "target", "type": "address", "internalType": "address"},
                    {"name": "callData", "type": "bytes", "internalType": "bytes"}
                ]
            },
            {"name": "userAddress", "type": "address", "internalType": "address"}
        ],
        "outputs": [
            {
                "name": "returnData", "type": "tuple[]", "internalType": "struct CustomMulticall2.Result[]",
                "components": [
                    {"name": "success", "type": "bool", "internalType": "bool"},
                    {"name": "returnData", "type": "bytes", "internalType": "bytes"}
                ]
            },
            {"name": "userNativeBalance", "type": "uint256", "internalType": "uint256"}
        ]
    },
    {
        "type": "function",
        "name": "tryBlockAndAggregate",
        "stateMutability": "nonpayable",
        "inputs": [
            {"name": "requireSuccess", "type": "bool", "internalType": "bool"},
            {
                "name": "calls", "type": "tuple[]", "internalType": "struct CustomMulticall2.Call[]",
                "components": [
                    {"name": "target", "type": "address", "internalType": "address"},
                    {"name": "callData", "type": "bytes", "internalType": "bytes"}
                ]
            }
        ],
        "outputs": [
            {"name": "blockNumber", "type": "uint256", "internalType": "uint256"},
            {"name": "blockHash", "type": "bytes32", "internalType": "bytes32"},
            {
                "name": "returnData", "type": "tuple[]", "internalType": "struct CustomMulticall2.Result[]",
                "components": [
                    {"name": "success", "type": "bool", "internalType": "bool"},
                    {"name": "returnData", "type": "bytes", "internalType": "bytes"}
                ]
            }
        ]
    },
    {
        "type": "function",
        "name": "getEthBalance",
        "stateMutability": "view",
        "inputs": [{"name": "addr", "type": "address", "internalType": "address"}],
        "outputs": [{"name": "balance", "type": "uint256", "internalType": "uint256"}]
    },
    {
        "type": "function",
        "name": "getBlockNumber",
        "stateMutability": "view",
        "inputs": [],
        "outputs": [{"name": "blockNumber", "type": "uint256", "internalType": "uint256"}]
    }
]"#;

/// Parsed aggregator ABI.
#[derive(Debug, Clone)]
pub struct AggregatorAbi {
    abi: JsonAbi,
}

impl AggregatorAbi {
    /// The bundled aggregator schema.
    pub fn bundled() -> Self {
        let abi = serde_json::from_str(BUNDLED_ABI).expect("bundled aggregator ABI is valid JSON");
        Self { abi }
    }

    /// Load a schema from a standard Ethereum ABI JSON document.
    pub fn from_json(abi_json: &str) -> Result<Self, MulticallError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| MulticallError::encoding("<abi>", format!("invalid ABI JSON: {e}")))?;
        Ok(Self { abi })
    }

    /// Look up a function by name. Overloads are not expected; the first
    /// declaration wins.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.abi.function(name).and_then(|overloads| overloads.first())
    }

    /// Names of all functions in the schema.
    pub fn function_names(&self) -> Vec<&str> {
        self.abi.functions().map(|f| f.name.as_str()).collect()
    }

    /// Reason text for a lookup of `name` that found nothing.
    pub(crate) fn missing_function(&self, name: &str) -> String {
        let names = self.function_names();
        if names.is_empty() {
            format!("`{name}` not found; aggregator ABI declares no functions")
        } else {
            format!("`{name}` not found in aggregator ABI (available: {})", names.join(", "))
        }
    }
}

impl Default for AggregatorAbi {
    fn default() -> Self {
        Self::bundled()
    }
}
