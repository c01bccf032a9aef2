use crate::{encoding::DecodeError, types::BidRequest};
use ethereum_consensus::{
    primitives::{BlsPublicKey, Hash32, Slot},
    Error as ConsensusError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no bid prepared for request {0}")]
    NoBidPrepared(Box<BidRequest>),
    #[error("could not find proposer for slot {0}")]
    MissingProposer(Slot),
    #[error("validator with public key {0:?} is not currently registered")]
    ValidatorNotRegistered(BlsPublicKey),
    #[error("validator with public key {0:?} is not pending or active")]
    ValidatorNotActive(BlsPublicKey),
    #[error("registration for validator {0:?} has a timestamp too far in the future")]
    RegistrationFromFuture(BlsPublicKey),
    #[error("bid trace does not match the execution payload: {0}")]
    BidTraceMismatch(&'static str),
    #[error("execution payload does not match the provided header")]
    InvalidExecutionPayloadInBlock,
    #[error("no payload found for block hash {0:?}")]
    MissingPayload(Hash32),
    #[error("no route matches the request")]
    RouteNotFound,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("could not merkleize: {0}")]
    Merkleization(String),
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[cfg(feature = "api")]
    #[error(transparent)]
    Api(#[from] beacon_api_client::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[cfg(feature = "api")]
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[cfg(feature = "api")]
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub message: String,
}

#[cfg(feature = "api")]
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = match self {
            Self::NoBidPrepared(..) => return StatusCode::NO_CONTENT.into_response(),
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(..) | Self::Api(..) | Self::Merkleization(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        let message = self.to_string();
        (code, Json(ErrorMessage { code: code.as_u16(), message })).into_response()
    }
}
