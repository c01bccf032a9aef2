use crate::{
    error::Error,
    signing::{verify_signed_builder_message, SigningDomain, SigningKeyPair},
    types::ExecutionPayload,
};
use ethereum_consensus::{
    primitives::{BlsPublicKey, BlsSignature, ExecutionAddress, Hash32, Slot, U256},
    ssz::prelude::*,
};

#[derive(
    Debug, Default, Clone, PartialEq, Eq, SimpleSerialize, serde::Serialize, serde::Deserialize,
)]
pub struct BidTrace {
    #[serde(with = "crate::serde::as_str")]
    pub slot: Slot,
    pub parent_hash: Hash32,
    pub block_hash: Hash32,
    #[serde(rename = "builder_pubkey")]
    pub builder_public_key: BlsPublicKey,
    #[serde(rename = "proposer_pubkey")]
    pub proposer_public_key: BlsPublicKey,
    pub proposer_fee_recipient: ExecutionAddress,
    #[serde(with = "crate::serde::as_str")]
    pub gas_limit: u64,
    #[serde(with = "crate::serde::as_str")]
    pub gas_used: u64,
    #[serde(with = "crate::serde::as_str")]
    pub value: U256,
}

impl BidTrace {
    pub fn sign(
        mut self,
        execution_payload: ExecutionPayload,
        key_pair: &SigningKeyPair,
        domain: &SigningDomain,
    ) -> Result<SignedBidSubmission, Error> {
        let signature = key_pair.sign(&mut self, domain)?;
        Ok(SignedBidSubmission { message: self, execution_payload, signature })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SignedBidSubmission {
    pub message: BidTrace,
    pub execution_payload: ExecutionPayload,
    pub signature: BlsSignature,
}

impl SignedBidSubmission {
    pub fn verify_signature(&mut self, domain: &SigningDomain) -> Result<(), Error> {
        let public_key = self.message.builder_public_key.clone();
        verify_signed_builder_message(&mut self.message, &self.signature, &public_key, domain)
            .map_err(From::from)
    }
}

impl SignedBidSubmission {
    /// Checks the bid trace commits to the execution payload it carries.
    pub fn validate_consistency(&self) -> Result<(), Error> {
        let trace = &self.message;
        let payload = &self.execution_payload;
        if trace.block_hash != payload.block_hash {
            return Err(Error::BidTraceMismatch("block hash"))
        }
        if trace.parent_hash != payload.parent_hash {
            return Err(Error::BidTraceMismatch("parent hash"))
        }
        if trace.gas_limit != payload.gas_limit {
            return Err(Error::BidTraceMismatch("gas limit"))
        }
        if trace.gas_used != payload.gas_used {
            return Err(Error::BidTraceMismatch("gas used"))
        }
        if trace.proposer_fee_recipient != payload.fee_recipient {
            return Err(Error::BidTraceMismatch("fee recipient"))
        }
        Ok(())
    }
}

impl std::fmt::Display for SignedBidSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.message.slot;
        let block_hash = &self.message.block_hash;
        let value = &self.message.value;
        write!(f, "slot {slot}, block hash {block_hash} and value {value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{compute_builder_domain, SecretKey};

    fn public_key(seed: u8) -> BlsPublicKey {
        SecretKey::try_from([seed; 32].as_slice()).unwrap().public_key()
    }

    #[test]
    fn test_bid_trace_encoding() {
        let trace = BidTrace {
            slot: 42,
            builder_public_key: public_key(1),
            proposer_public_key: public_key(2),
            gas_limit: 30_000_000,
            gas_used: 21_000,
            value: U256::from(100u64),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&trace).unwrap();
        assert_eq!(encoded["slot"], "42");
        assert_eq!(encoded["gas_used"], "21000");
        assert_eq!(encoded["value"], "100");
        assert!(encoded.get("builder_pubkey").is_some());

        let decoded: BidTrace = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, trace);
    }

    #[test]
    fn test_submission_signature() {
        let key_pair = SigningKeyPair::from_hex(&format!("0x{}", "03".repeat(32))).unwrap();
        let domain = compute_builder_domain([0, 0, 0, 0]).unwrap();
        let trace = BidTrace {
            slot: 1,
            builder_public_key: key_pair.public_key().clone(),
            ..Default::default()
        };
        let mut submission = trace.sign(ExecutionPayload::default(), &key_pair, &domain).unwrap();
        submission.verify_signature(&domain).unwrap();

        submission.validate_consistency().unwrap();

        submission.message.slot = 2;
        assert!(submission.verify_signature(&domain).is_err());
    }

    #[test]
    fn test_inconsistent_submission() {
        let key_pair = SigningKeyPair::from_hex(&format!("0x{}", "03".repeat(32))).unwrap();
        let domain = compute_builder_domain([0, 0, 0, 0]).unwrap();
        let trace = BidTrace { gas_limit: 30_000_000, ..Default::default() };
        let payload = ExecutionPayload { gas_limit: 29_000_000, ..Default::default() };
        let submission = trace.sign(payload, &key_pair, &domain).unwrap();
        assert!(matches!(
            submission.validate_consistency(),
            Err(Error::BidTraceMismatch("gas limit"))
        ));
    }
}
