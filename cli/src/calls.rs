//! Reading call lists from flags and files.

use std::path::Path;

use alloy_primitives::{Address, Bytes};
use anyhow::{anyhow, Context, Result};
use chaincall_core::Call;

/// Parse `name=0xtarget:0xcalldata`. The calldata may be `0x` (empty).
pub fn parse_call_spec(spec: &str) -> Result<Call> {
    let (name, rest) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("call '{spec}' is not of the form name=target:data"))?;
    if name.is_empty() {
        return Err(anyhow!("call '{spec}' has an empty name"));
    }
    let (target, data) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("call '{spec}' is missing ':' between target and data"))?;

    let target: Address = target
        .parse()
        .with_context(|| format!("call '{name}': invalid target address '{target}'"))?;
    let data = hex::decode(data.trim_start_matches("0x"))
        .with_context(|| format!("call '{name}': invalid calldata hex"))?;

    Ok(Call::new(name, target, Bytes::from(data)))
}

/// Read a JSON array of `{ "name", "target", "callData" }` objects.
pub fn load_calls_file(path: &Path) -> Result<Vec<Call>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read calls file '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse calls file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_target_data() {
        let call =
            parse_call_spec("supply=0x6b175474e89094c44da98b954eedeac495271d0f:0x18160ddd").unwrap();
        assert_eq!(call.name, "supply");
        assert_eq!(
            call.target,
            "0x6b175474e89094c44da98b954eedeac495271d0f".parse::<Address>().unwrap()
        );
        assert_eq!(call.call_data.to_vec(), vec![0x18, 0x16, 0x0d, 0xdd]);
    }

    #[test]
    fn empty_calldata_is_allowed() {
        let call = parse_call_spec("ping=0x0000000000000000000000000000000000000001:0x").unwrap();
        assert!(call.call_data.is_empty());
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for bad in [
            "no-equals",
            "=0x0000000000000000000000000000000000000001:0x",
            "x=0x0000000000000000000000000000000000000001",
            "x=not-an-address:0x",
            "x=0x0000000000000000000000000000000000000001:0xzz",
        ] {
            assert!(parse_call_spec(bad).is_err(), "{bad} should fail");
        }
    }
}
