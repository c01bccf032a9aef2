pub mod blinded_block_provider;
pub mod blinded_block_relayer;
pub mod config;
pub mod encoding;
mod error;
pub mod serde;
pub mod signing;
pub mod types;

pub use blinded_block_provider::BlindedBlockProvider;
pub use blinded_block_relayer::BlindedBlockRelayer;
#[cfg(feature = "api")]
pub use error::ErrorMessage;
pub use error::Error;
