use crate::Error;
use ethereum_consensus::primitives::ExecutionAddress;
use mev_rs::{signing::SigningDomain, types::SignedBidSubmission};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AccessListError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Rejects blocks that interact with any blocklisted account.
#[derive(Debug, Default, Clone)]
pub struct AccessVerifier {
    blocklist: Vec<ExecutionAddress>,
}

impl AccessVerifier {
    pub fn new(blocklist: Vec<ExecutionAddress>) -> Self {
        Self { blocklist }
    }

    /// Reads a JSON array of `0x`-prefixed addresses.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AccessListError> {
        let data = std::fs::read_to_string(path)?;
        let blocklist: Vec<ExecutionAddress> = serde_json::from_str(&data)?;
        Ok(Self::new(blocklist))
    }

    pub fn len(&self) -> usize {
        self.blocklist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocklist.is_empty()
    }

    pub fn verify<'a>(
        &self,
        addresses: impl IntoIterator<Item = &'a ExecutionAddress>,
    ) -> Result<(), Error> {
        for address in addresses {
            if self.blocklist.contains(address) {
                return Err(Error::BlocklistedAddress(address.clone()))
            }
        }
        Ok(())
    }
}

/// Checks the submissions a dry-run builder would have sent to its relay.
#[derive(Debug, Clone)]
pub struct BlockValidator {
    builder_domain: SigningDomain,
    access_verifier: Option<AccessVerifier>,
}

impl BlockValidator {
    pub fn new(builder_domain: SigningDomain, access_verifier: Option<AccessVerifier>) -> Self {
        Self { builder_domain, access_verifier }
    }

    pub fn validate_builder_submission(
        &self,
        submission: &SignedBidSubmission,
        touched_addresses: &[ExecutionAddress],
    ) -> Result<(), Error> {
        let mut submission = submission.clone();
        submission.verify_signature(&self.builder_domain)?;
        submission.validate_consistency()?;

        if let Some(access_verifier) = &self.access_verifier {
            let payload = &submission.execution_payload;
            access_verifier
                .verify(std::iter::once(&payload.fee_recipient).chain(touched_addresses))?;
        }

        debug!(%submission, "builder submission is valid");
        Ok(())
    }
}
