use ethereum_consensus::primitives::{ExecutionAddress, Hash32, U256};
use mev_rs::types::ExecutionPayload;
use serde::{Deserialize, Serialize};

/// Transactions submitted for atomic inclusion at a given block height.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// `0x`-encoded signed transactions
    pub txs: Vec<String>,
    #[serde(with = "mev_rs::serde::as_hex_quantity")]
    pub block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reverting_tx_hashes: Vec<Hash32>,
}

/// A block produced by the chain backend for a set of payload attributes.
#[derive(Debug, Clone)]
pub struct BuiltBlock {
    pub payload: ExecutionPayload,
    /// Total value paid to the proposer's fee recipient.
    pub value: U256,
    pub bundles: Vec<Bundle>,
    /// Every account read or written while executing the block.
    pub touched_addresses: Vec<ExecutionAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_encoding() {
        let bundle = Bundle {
            txs: vec!["0x02f8".to_string()],
            block_number: 17_000_000,
            min_timestamp: Some(1_700_000_000),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&bundle).unwrap();
        assert_eq!(encoded["blockNumber"], "0x1036640");
        assert_eq!(encoded["minTimestamp"], 1_700_000_000u64);
        assert!(encoded.get("maxTimestamp").is_none());
        assert!(encoded.get("revertingTxHashes").is_none());

        let decoded: Bundle = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, bundle);
    }
}
