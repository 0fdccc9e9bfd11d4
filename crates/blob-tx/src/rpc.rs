//! [`BlobTxClient`] over an alloy JSON-RPC provider.

use crate::client::{BlobTxClient, ChainHeader, GasQuery};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, TxHash, TxKind},
    providers::Provider,
    rpc::types::{BlockTransactionsKind, TransactionInput, TransactionRequest},
    transports::{TransportErrorKind, TransportResult},
};
use std::{future::Future, time::Duration};
use tracing::trace;

/// Rpc backed chain client. Every call is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct RpcBlobTxClient<P> {
    provider: P,
    timeout: Duration,
}

impl<P: Provider> RpcBlobTxClient<P> {
    /// Create a new [Self].
    pub const fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// The underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    async fn timed<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = TransportResult<T>>,
    ) -> TransportResult<T> {
        trace!(method, "rpc call");
        tokio::time::timeout(self.timeout, call).await.map_err(|_| {
            TransportErrorKind::custom_str(&format!("{method} timed out after {:?}", self.timeout))
        })?
    }
}

impl<P: Provider> BlobTxClient for RpcBlobTxClient<P> {
    async fn latest_header(&self) -> TransportResult<ChainHeader> {
        let block = self
            .timed("eth_getBlockByNumber", async {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
                    .await
            })
            .await?
            .ok_or_else(|| TransportErrorKind::custom_str("latest block not found"))?;

        let base_fee = block
            .header
            .base_fee_per_gas
            .ok_or_else(|| TransportErrorKind::custom_str("latest block has no base fee"))?;

        Ok(ChainHeader { base_fee, excess_blob_gas: block.header.excess_blob_gas })
    }

    async fn suggest_tip_cap(&self) -> TransportResult<u128> {
        self.timed("eth_maxPriorityFeePerGas", async {
            self.provider.get_max_priority_fee_per_gas().await
        })
        .await
    }

    async fn estimate_gas(&self, query: GasQuery) -> TransportResult<u64> {
        let request = TransactionRequest {
            from: Some(query.from),
            to: Some(TxKind::Call(query.to)),
            max_fee_per_gas: Some(query.fee_cap),
            max_priority_fee_per_gas: Some(query.tip_cap),
            input: TransactionInput::new(query.input),
            ..Default::default()
        };

        self.timed("eth_estimateGas", async { self.provider.estimate_gas(&request).await }).await
    }

    async fn pending_nonce(&self, account: Address) -> TransportResult<u64> {
        self.timed("eth_getTransactionCount", async {
            self.provider.get_transaction_count(account).pending().await
        })
        .await
    }

    async fn chain_id(&self) -> TransportResult<u64> {
        self.timed("eth_chainId", async { self.provider.get_chain_id().await }).await
    }

    async fn broadcast(&self, raw: Bytes) -> TransportResult<TxHash> {
        let pending = self
            .timed("eth_sendRawTransaction", async {
                self.provider.send_raw_transaction(&raw).await
            })
            .await?;

        Ok(*pending.tx_hash())
    }
}
