//! Aggregator configuration.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::block::BlockTag;
use crate::decoder::LeadingEntries;

/// Where the aggregator lives and how batches against it are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticallConfig {
    /// Address of the deployed aggregator contract.
    pub contract: Address,
    /// Block every call executes against.
    #[serde(default)]
    pub block: BlockTag,
    /// Handling of surplus leading result entries.
    #[serde(default)]
    pub leading_entries: LeadingEntries,
    /// Revert the whole batch when any sub-call fails.
    #[serde(default)]
    pub require_success: bool,
}

impl MulticallConfig {
    /// Config for `contract` with every other field at its default.
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            block: BlockTag::default(),
            leading_entries: LeadingEntries::default(),
            require_success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: MulticallConfig =
            serde_json::from_str(r#"{"contract":"0x5ba1e12693dc8f9c48aad8770482f4739beed696"}"#)
                .unwrap();
        assert_eq!(cfg.block, BlockTag::Latest);
        assert_eq!(cfg.leading_entries, LeadingEntries::Strict);
        assert!(!cfg.require_success);
    }

    #[test]
    fn full_config() {
        let cfg: MulticallConfig = serde_json::from_str(
            r#"{
                "contract": "0x5ba1e12693dc8f9c48aad8770482f4739beed696",
                "block": 18000000,
                "leading_entries": {"detect": {"max": 2}},
                "require_success": true
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.block, BlockTag::Number(18_000_000));
        assert_eq!(cfg.leading_entries, LeadingEntries::Detect { max: 2 });
        assert!(cfg.require_success);
    }
}
