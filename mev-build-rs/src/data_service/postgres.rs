use crate::{
    types::{Bundle, BuiltBlock},
    Error,
};
use mev_rs::types::ValidatorPreferences;
use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    Row,
};
use std::time::Duration;
use tracing::trace;

const MAX_CONNECTIONS: u32 = 8;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
// upper bound on bundles considered for a single block
const MAX_BUNDLES_PER_BLOCK: i64 = 500;

const INSERT_BUILT_BLOCK: &str = "INSERT INTO built_blocks \
    (block_number, block_hash, parent_hash, fee_recipient, proposer_pubkey, gas_limit, gas_used, \
    tx_count, bundle_count, profit) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

const SELECT_BUNDLES: &str = "SELECT param_signed_txs, param_block_number, param_min_timestamp, \
    param_max_timestamp FROM bundles WHERE param_block_number = $1 \
    ORDER BY inserted_at ASC LIMIT $2";

// values past `i64::MAX` do not occur for block numbers, gas or counts
fn as_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn bundle_from_row(row: &PgRow) -> Result<Bundle, sqlx::Error> {
    let txs: String = row.try_get("param_signed_txs")?;
    let block_number: i64 = row.try_get("param_block_number")?;
    let min_timestamp: Option<i64> = row.try_get("param_min_timestamp")?;
    let max_timestamp: Option<i64> = row.try_get("param_max_timestamp")?;
    Ok(Bundle {
        txs: txs.split(',').filter(|tx| !tx.is_empty()).map(String::from).collect(),
        block_number: block_number.max(0) as u64,
        min_timestamp: min_timestamp.map(|ts| ts.max(0) as u64),
        max_timestamp: max_timestamp.map(|ts| ts.max(0) as u64),
        reverting_tx_hashes: vec![],
    })
}

#[derive(Clone)]
pub struct PostgresDataService {
    pool: PgPool,
}

impl PostgresDataService {
    pub async fn connect(dsn: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    pub async fn consume_built_block(
        &self,
        block: &BuiltBlock,
        proposer: &ValidatorPreferences,
    ) -> Result<(), Error> {
        let payload = &block.payload;
        sqlx::query(INSERT_BUILT_BLOCK)
            .bind(as_sql_int(payload.block_number))
            .bind(payload.block_hash.to_string())
            .bind(payload.parent_hash.to_string())
            .bind(payload.fee_recipient.to_string())
            .bind(proposer.public_key.to_string())
            .bind(as_sql_int(payload.gas_limit))
            .bind(as_sql_int(payload.gas_used))
            .bind(as_sql_int(payload.transactions.len() as u64))
            .bind(as_sql_int(block.bundles.len() as u64))
            .bind(block.value.to_string())
            .execute(&self.pool)
            .await?;
        trace!(block_number = payload.block_number, "recorded built block");
        Ok(())
    }

    pub async fn get_bundles(&self, block_number: u64) -> Result<Vec<Bundle>, Error> {
        let rows = sqlx::query(SELECT_BUNDLES)
            .bind(as_sql_int(block_number))
            .bind(MAX_BUNDLES_PER_BLOCK)
            .fetch_all(&self.pool)
            .await?;
        let bundles = rows.iter().map(bundle_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(bundles)
    }
}
