use crate::{
    blinded_block_provider::BlindedBlockProvider,
    error::Error,
    types::{
        BidRequest, ExecutionPayload, SignedBlindedBeaconBlock, SignedBuilderBid,
        SignedValidatorRegistration, VersionedValue,
    },
};
use axum::{
    extract::{Json, Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tracing::{info, trace};

async fn handle_get_root<B: BlindedBlockProvider>(State(provider): State<B>) -> Html<String> {
    trace!("serving root");
    let summary = provider.summary();
    let fork_data = &summary.fork_data;
    Html(format!(
        r#"<html>
<head><title>builder</title></head>
<body>
<h1>builder API</h1>
<p>relay public key: {0}</p>
<p>genesis fork version: {1}</p>
<p>bellatrix fork version: {2}</p>
<p>genesis validators root: {3}</p>
<p>registered validators: {4}</p>
</body>
</html>
"#,
        summary.public_key,
        fork_data.genesis_fork_version,
        fork_data.bellatrix_fork_version,
        fork_data.genesis_validators_root,
        summary.registered_validators,
    ))
}

async fn handle_status_check() -> impl IntoResponse {
    trace!("status check");
    StatusCode::OK
}

async fn handle_validator_registration<B: BlindedBlockProvider>(
    State(provider): State<B>,
    Json(mut registrations): Json<Vec<SignedValidatorRegistration>>,
) -> Result<(), Error> {
    trace!(count = registrations.len(), "processing registrations");
    provider.register_validators(&mut registrations).await
}

async fn handle_fetch_bid<B: BlindedBlockProvider>(
    State(provider): State<B>,
    Path((slot, parent_hash, public_key)): Path<(String, String, String)>,
) -> Result<Json<VersionedValue<SignedBuilderBid>>, Error> {
    let bid_request = BidRequest::from_path_segments(&slot, &parent_hash, &public_key)?;
    trace!(%bid_request, "fetching best bid");
    let signed_bid = provider.fetch_best_bid(&bid_request).await?;
    Ok(Json(VersionedValue::bellatrix(signed_bid)))
}

async fn handle_open_bid<B: BlindedBlockProvider>(
    State(provider): State<B>,
    Json(mut block): Json<SignedBlindedBeaconBlock>,
) -> Result<Json<VersionedValue<ExecutionPayload>>, Error> {
    trace!(slot = block.message.slot, "opening bid");
    let payload = provider.open_bid(&mut block).await?;
    Ok(Json(VersionedValue::bellatrix(payload)))
}

/// Logs every request passing through the router.
pub async fn log_request<B>(request: Request<B>, next: Next<B>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();
    let response = next.run(request).await;
    info!(%method, %uri, status = %response.status(), elapsed = ?start.elapsed(), "served request");
    response
}

/// Builds the builder API surface backed by `provider`.
pub fn router<B>(provider: B) -> Router
where
    B: BlindedBlockProvider + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handle_get_root::<B>))
        .route("/eth/v1/builder/status", get(handle_status_check))
        .route("/eth/v1/builder/validators", post(handle_validator_registration::<B>))
        .route(
            "/eth/v1/builder/header/:slot/:parent_hash/:public_key",
            get(handle_fetch_bid::<B>),
        )
        .route("/eth/v1/builder/blinded_blocks", post(handle_open_bid::<B>))
        .layer(middleware::from_fn(log_request))
        .with_state(provider)
}
