use crate::{
    error::Error,
    signing::{verify_signed_builder_message, SigningDomain, SigningKeyPair},
    types::{ExecutionPayload, ExecutionPayloadHeader},
};
use ethereum_consensus::{
    primitives::{BlsPublicKey, BlsSignature, U256},
    ssz::prelude::*,
};
use std::fmt;

#[derive(Debug, Default, Clone, SimpleSerialize, serde::Serialize, serde::Deserialize)]
pub struct BuilderBid {
    pub header: ExecutionPayloadHeader,
    #[serde(with = "crate::serde::as_str")]
    pub value: U256,
    #[serde(rename = "pubkey")]
    pub public_key: BlsPublicKey,
}

impl BuilderBid {
    pub fn sign(
        mut self,
        key_pair: &SigningKeyPair,
        domain: &SigningDomain,
    ) -> Result<SignedBuilderBid, Error> {
        let signature = key_pair.sign(&mut self, domain)?;
        Ok(SignedBuilderBid { message: self, signature })
    }
}

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct SignedBuilderBid {
    pub message: BuilderBid,
    pub signature: BlsSignature,
}

impl fmt::Display for SignedBuilderBid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let block_hash = &self.message.header.block_hash;
        let value = &self.message.value;
        write!(f, "block hash {block_hash} and value {value}")
    }
}

impl SignedBuilderBid {
    pub fn verify_signature(&mut self, domain: &SigningDomain) -> Result<(), Error> {
        let public_key = self.message.public_key.clone();
        verify_signed_builder_message(&mut self.message, &self.signature, &public_key, domain)
            .map_err(From::from)
    }
}

/// Derives the header committing to `payload`.
pub fn execution_payload_header(
    payload: &ExecutionPayload,
) -> Result<ExecutionPayloadHeader, Error> {
    let mut transactions = payload.transactions.clone();
    let transactions_root =
        transactions.hash_tree_root().map_err(|err| Error::Merkleization(err.to_string()))?;
    Ok(ExecutionPayloadHeader {
        parent_hash: payload.parent_hash.clone(),
        fee_recipient: payload.fee_recipient.clone(),
        state_root: payload.state_root.clone(),
        receipts_root: payload.receipts_root.clone(),
        logs_bloom: payload.logs_bloom.clone(),
        prev_randao: payload.prev_randao.clone(),
        block_number: payload.block_number,
        gas_limit: payload.gas_limit,
        gas_used: payload.gas_used,
        timestamp: payload.timestamp,
        extra_data: payload.extra_data.clone(),
        base_fee_per_gas: payload.base_fee_per_gas.clone(),
        block_hash: payload.block_hash.clone(),
        transactions_root,
    })
}
