//! Nonce resolution.

use crate::{client::BlobTxClient, error::Error};
use alloy::primitives::Address;
use tracing::debug;

/// Resolve the nonce to send with.
///
/// An explicit nonce is returned as is. Otherwise the pending nonce of `account` is fetched.
/// Two concurrent calls for the same account may observe the same pending nonce; reserving
/// nonces across calls is left to the caller.
pub async fn resolve_nonce<C: BlobTxClient>(
    client: &C,
    account: Address,
    explicit: Option<u64>,
) -> Result<u64, Error> {
    if let Some(nonce) = explicit {
        return Ok(nonce);
    }

    let nonce = client.pending_nonce(account).await.map_err(Error::NonceResolutionFailed)?;
    debug!(%account, nonce, "fetched pending nonce");

    Ok(nonce)
}
