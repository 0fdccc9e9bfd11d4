//! Fee parameter resolution.

use crate::{
    client::{BlobTxClient, ChainHeader},
    error::Error,
};
use alloy::eips::eip4844::calc_blob_gasprice;
use tracing::{debug, warn};

/// Excess blob gas used to price blobs when the latest header does not report any.
///
/// This is a placeholder and is not a safe production default. It should be replaced by a
/// configured value for any real deployment, see [`crate::BlobTxConfig`].
pub const DEFAULT_EXCESS_BLOB_GAS: u64 = 100_066;

/// Multiplier applied to the base fee when deriving a default fee cap.
pub const BASE_FEE_MULTIPLIER: u128 = 2;

/// Resolved fees of a blob transaction. `fee_cap >= tip_cap` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    /// Max priority fee per gas.
    pub tip_cap: u128,
    /// Max fee per gas.
    pub fee_cap: u128,
    /// Max fee per blob gas.
    pub blob_fee_cap: u128,
}

/// Caller supplied fee overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeOverrides {
    /// Explicit max priority fee per gas.
    pub tip_cap: Option<u128>,
    /// Explicit max fee per gas.
    pub fee_cap: Option<u128>,
}

/// Default fee cap of `tip_cap + 2 * base_fee`.
pub const fn default_fee_cap(tip_cap: u128, base_fee: u64) -> u128 {
    tip_cap.saturating_add((base_fee as u128).saturating_mul(BASE_FEE_MULTIPLIER))
}

/// Max fee per blob gas for the given excess blob gas, falling back to
/// `fallback_excess_blob_gas` when the header does not provide one.
pub fn blob_fee_cap(excess_blob_gas: Option<u64>, fallback_excess_blob_gas: u64) -> u128 {
    let excess = excess_blob_gas.unwrap_or_else(|| {
        warn!(
            fallback_excess_blob_gas,
            "latest header has no excess blob gas, pricing blob gas with fallback"
        );
        fallback_excess_blob_gas
    });
    calc_blob_gasprice(excess)
}

/// Resolve tip cap, fee cap and blob fee cap from the latest header and overrides.
///
/// The client is only queried for a tip cap suggestion when no override is given.
pub async fn resolve_fees<C: BlobTxClient>(
    client: &C,
    header: &ChainHeader,
    overrides: FeeOverrides,
    fallback_excess_blob_gas: u64,
) -> Result<FeeParams, Error> {
    let tip_cap = match overrides.tip_cap {
        Some(tip_cap) => tip_cap,
        None => client.suggest_tip_cap().await.map_err(Error::ChainStateFetchFailed)?,
    };

    let fee_cap = overrides.fee_cap.unwrap_or_else(|| default_fee_cap(tip_cap, header.base_fee));
    if fee_cap < tip_cap {
        return Err(Error::InvalidFeeOrdering { fee_cap, tip_cap });
    }

    let blob_fee_cap = blob_fee_cap(header.excess_blob_gas, fallback_excess_blob_gas);
    debug!(tip_cap, fee_cap, blob_fee_cap, base_fee = header.base_fee, "resolved fees");

    Ok(FeeParams { tip_cap, fee_cap, blob_fee_cap })
}
