use crate::{
    encoding::{decode_prefixed_hex_exact, is_decimal, is_prefixed_hex},
    error::Error,
};
use ethereum_consensus::primitives::{BlsPublicKey, Hash32, Slot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidRequest {
    #[serde(with = "crate::serde::as_str")]
    pub slot: Slot,
    pub parent_hash: Hash32,
    #[serde(rename = "pubkey")]
    pub public_key: BlsPublicKey,
}

impl BidRequest {
    /// Parses the `{slot}/{parent_hash}/{pubkey}` segments of a header request.
    ///
    /// Segments that do not match the route pattern yield [`Error::RouteNotFound`] so the
    /// request is treated as unmatched; well-formed segments that fail to decode are bad requests.
    pub fn from_path_segments(
        slot: &str,
        parent_hash: &str,
        public_key: &str,
    ) -> Result<Self, Error> {
        if !is_decimal(slot) || !is_prefixed_hex(parent_hash) || !is_prefixed_hex(public_key) {
            return Err(Error::RouteNotFound)
        }
        let slot = slot.parse::<Slot>().map_err(|err| Error::InvalidRequest(err.to_string()))?;
        let parent_hash = decode_prefixed_hex_exact::<32>(parent_hash)?;
        let parent_hash = Hash32::try_from(parent_hash.as_slice())
            .map_err(|err| Error::InvalidRequest(err.to_string()))?;
        let public_key = decode_prefixed_hex_exact::<48>(public_key)?;
        let public_key = BlsPublicKey::try_from(public_key.as_slice())
            .map_err(|err| Error::InvalidRequest(err.to_string()))?;
        Ok(Self { slot, parent_hash, public_key })
    }
}

impl std::fmt::Display for BidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot;
        let parent_hash = &self.parent_hash;
        let public_key = &self.public_key;
        write!(f, "slot {slot}, parent hash {parent_hash} and proposer {public_key}")
    }
}
