mod postgres;

pub use postgres::PostgresDataService;

use crate::{
    types::{Bundle, BuiltBlock},
    Error,
};
use mev_rs::types::ValidatorPreferences;
use tracing::{error, info};

/// Where built blocks are recorded and pending bundles come from.
#[derive(Clone)]
pub enum DataService {
    Postgres(PostgresDataService),
    /// Stores nothing and has no bundles.
    Nil,
}

impl DataService {
    pub async fn consume_built_block(
        &self,
        block: &BuiltBlock,
        proposer: &ValidatorPreferences,
    ) -> Result<(), Error> {
        match self {
            Self::Postgres(service) => service.consume_built_block(block, proposer).await,
            Self::Nil => Ok(()),
        }
    }

    pub async fn get_bundles(&self, block_number: u64) -> Result<Vec<Bundle>, Error> {
        match self {
            Self::Postgres(service) => service.get_bundles(block_number).await,
            Self::Nil => Ok(vec![]),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

/// Connects to the persistence backend at `dsn`, if any.
///
/// Persistence is optional: a missing DSN or a backend that cannot be reached
/// selects [`DataService::Nil`] instead of failing.
pub async fn resolve_data_service(dsn: Option<&str>) -> DataService {
    let dsn = match dsn {
        Some(dsn) if !dsn.is_empty() => dsn,
        _ => {
            info!("no database DSN provided, not persisting builder data");
            return DataService::Nil
        }
    };

    match PostgresDataService::connect(dsn).await {
        Ok(service) => {
            info!("connected to database");
            DataService::Postgres(service)
        }
        Err(err) => {
            error!(%err, "could not connect to the database, not persisting builder data");
            DataService::Nil
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_dsn_selects_nil() {
        assert!(resolve_data_service(None).await.is_nil());
        assert!(resolve_data_service(Some("")).await.is_nil());
    }

    #[tokio::test]
    async fn test_unusable_dsn_falls_back_to_nil() {
        assert!(resolve_data_service(Some("not a dsn")).await.is_nil());
        let unreachable = "postgres://builder@127.0.0.1:1/builder";
        assert!(resolve_data_service(Some(unreachable)).await.is_nil());
    }

    #[tokio::test]
    async fn test_nil_service() {
        let service = DataService::Nil;
        assert!(service.get_bundles(1).await.unwrap().is_empty());
    }
}
