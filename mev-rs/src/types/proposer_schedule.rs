use crate::types::{SignedValidatorRegistration, ValidatorRegistration};
use ethereum_consensus::primitives::{BlsPublicKey, ExecutionAddress, Slot, ValidatorIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProposerSchedule {
    #[serde(with = "crate::serde::as_str")]
    pub slot: Slot,
    #[serde(with = "crate::serde::as_str")]
    pub validator_index: ValidatorIndex,
    pub entry: SignedValidatorRegistration,
}

/// What a proposer asked for when it registered with a relay.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorPreferences {
    #[serde(rename = "pubkey")]
    pub public_key: BlsPublicKey,
    pub fee_recipient: ExecutionAddress,
    #[serde(with = "crate::serde::as_str")]
    pub gas_limit: u64,
}

impl From<&ValidatorRegistration> for ValidatorPreferences {
    fn from(registration: &ValidatorRegistration) -> Self {
        Self {
            public_key: registration.public_key.clone(),
            fee_recipient: registration.fee_recipient.clone(),
            gas_limit: registration.gas_limit,
        }
    }
}

impl From<&ProposerSchedule> for ValidatorPreferences {
    fn from(schedule: &ProposerSchedule) -> Self {
        Self::from(&schedule.entry.message)
    }
}
