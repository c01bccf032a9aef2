use ethereum_consensus::primitives::{Bytes32, ExecutionAddress, Hash32, Slot};
use serde::{Deserialize, Serialize};

/// Parameters for the block a builder should target in the next slot.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    #[serde(with = "crate::serde::as_hex_quantity")]
    pub timestamp: u64,
    #[serde(rename = "prevRandao")]
    pub prev_randao: Bytes32,
    #[serde(default)]
    pub suggested_fee_recipient: ExecutionAddress,
    pub slot: Slot,
    #[serde(rename = "blockHash")]
    pub head_hash: Hash32,
    #[serde(default, alias = "GasLimit")]
    pub gas_limit: u64,
}

impl std::fmt::Display for PayloadAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot;
        let head_hash = &self.head_hash;
        let timestamp = self.timestamp;
        write!(f, "slot {slot} on head {head_hash} at timestamp {timestamp}")
    }
}
