//! Signing domains and key material for the builder APIs.
//!
//! A [`SigningDomain`] binds a signature to a protocol context (domain type) and a network
//! (fork version and genesis validators root). Domains are computed once at startup and shared
//! read-only by every signing call site.

use crate::encoding::{decode_prefixed_hex, DecodeError};
pub use ethereum_consensus::{crypto::SecretKey, domains::DomainType};
use ethereum_consensus::{
    phase0::mainnet::compute_fork_data_root,
    primitives::{BlsPublicKey, BlsSignature, Domain, Root},
    signing::{sign_with_domain, verify_signed_data},
    ssz::prelude::SimpleSerialize,
    Error as ConsensusError,
};
use std::fmt;
use thiserror::Error;

pub type ForkVersion = [u8; 4];

pub const DOMAIN_LEN: usize = 32;

/// A 32-byte domain separator: `domain_type || fork_data_root[..28]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigningDomain([u8; DOMAIN_LEN]);

impl SigningDomain {
    pub fn as_bytes(&self) -> &[u8; DOMAIN_LEN] {
        &self.0
    }

    fn to_domain(self) -> Domain {
        self.0
    }
}

impl AsRef<[u8]> for SigningDomain {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for SigningDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for SigningDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

pub fn compute_domain(
    domain_type: DomainType,
    fork_version: ForkVersion,
    genesis_validators_root: &Root,
) -> Result<SigningDomain, ConsensusError> {
    let fork_data_root = compute_fork_data_root(fork_version, *genesis_validators_root)?;
    let mut domain = [0u8; DOMAIN_LEN];
    domain[..4].copy_from_slice(&domain_type.as_bytes());
    domain[4..].copy_from_slice(&fork_data_root.as_ref()[..28]);
    Ok(SigningDomain(domain))
}

/// The builder domain is always computed against the zero root.
pub fn compute_builder_domain(
    genesis_fork_version: ForkVersion,
) -> Result<SigningDomain, ConsensusError> {
    compute_domain(DomainType::ApplicationBuilder, genesis_fork_version, &Root::default())
}

pub fn compute_proposer_domain(
    bellatrix_fork_version: ForkVersion,
    genesis_validators_root: &Root,
) -> Result<SigningDomain, ConsensusError> {
    compute_domain(DomainType::BeaconProposer, bellatrix_fork_version, genesis_validators_root)
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Crypto(#[from] ethereum_consensus::crypto::Error),
}

/// A BLS secret key together with its public key.
pub struct SigningKeyPair {
    secret_key: SecretKey,
    public_key: BlsPublicKey,
}

impl SigningKeyPair {
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self { secret_key, public_key }
    }

    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let bytes = decode_prefixed_hex(input)?;
        let secret_key = SecretKey::try_from(bytes.as_slice())?;
        Ok(Self::new(secret_key))
    }

    pub fn public_key(&self) -> &BlsPublicKey {
        &self.public_key
    }

    pub fn sign<T: SimpleSerialize>(
        &self,
        message: &mut T,
        domain: &SigningDomain,
    ) -> Result<BlsSignature, ConsensusError> {
        sign_builder_message(message, &self.secret_key, domain)
    }
}

// NOTE: the secret key must never reach the logs
impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair").field("public_key", &self.public_key).finish()
    }
}

pub fn sign_builder_message<T: SimpleSerialize>(
    message: &mut T,
    signing_key: &SecretKey,
    domain: &SigningDomain,
) -> Result<BlsSignature, ConsensusError> {
    let signature = sign_with_domain(message, signing_key, domain.to_domain())?;
    Ok(signature)
}

pub fn verify_signed_builder_message<T: SimpleSerialize>(
    message: &mut T,
    signature: &BlsSignature,
    public_key: &BlsPublicKey,
    domain: &SigningDomain,
) -> Result<(), ConsensusError> {
    verify_signed_data(message, signature, public_key, domain.to_domain())?;
    Ok(())
}

/// Verifies a consensus object, e.g. a blinded block, under the proposer domain.
pub fn verify_signed_consensus_message<T: SimpleSerialize>(
    message: &mut T,
    signature: &BlsSignature,
    public_key: &BlsPublicKey,
    proposer_domain: &SigningDomain,
) -> Result<(), ConsensusError> {
    verify_signed_builder_message(message, signature, public_key, proposer_domain)
}
