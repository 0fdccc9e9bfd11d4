//! Chain capabilities consumed while building a blob transaction.

use alloy::{
    primitives::{Address, Bytes, TxHash},
    transports::TransportResult,
};
use std::future::Future;

/// Fields of the latest header that feed into fee resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHeader {
    /// Base fee per gas of the latest block.
    pub base_fee: u64,
    /// Excess blob gas of the latest block, if the chain reports it.
    pub excess_blob_gas: Option<u64>,
}

/// Call used to estimate the execution gas of a blob transaction. Blob data is never part of
/// the estimate since it does not travel in calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasQuery {
    /// Sending account.
    pub from: Address,
    /// Recipient, [`Address::ZERO`] when the request had none.
    pub to: Address,
    /// Max priority fee per gas.
    pub tip_cap: u128,
    /// Max fee per gas.
    pub fee_cap: u128,
    /// Transaction input.
    pub input: Bytes,
}

/// Chain interaction needed to construct and broadcast blob transactions.
///
/// Implementations are shared across concurrent construction calls and must be safe to use
/// from multiple tasks.
pub trait BlobTxClient: Send + Sync {
    /// Fetch the latest block header.
    fn latest_header(&self) -> impl Future<Output = TransportResult<ChainHeader>> + Send;

    /// Suggested max priority fee per gas.
    fn suggest_tip_cap(&self) -> impl Future<Output = TransportResult<u128>> + Send;

    /// Estimate the gas limit for the given call.
    fn estimate_gas(&self, query: GasQuery) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Next nonce of `account`, including pending transactions.
    fn pending_nonce(&self, account: Address)
        -> impl Future<Output = TransportResult<u64>> + Send;

    /// Chain id of the connected chain.
    fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Broadcast an EIP-2718 encoded transaction in its network form (body and sidecar).
    fn broadcast(&self, raw: Bytes) -> impl Future<Output = TransportResult<TxHash>> + Send;
}
