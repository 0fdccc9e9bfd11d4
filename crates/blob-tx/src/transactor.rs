//! Assemble, sign and submit blob transactions.

use crate::{
    client::{BlobTxClient, GasQuery},
    config::BlobTxConfig,
    error::Error,
    fees::{self, FeeParams},
    nonce,
    request::BlobTxRequest,
};
use alloy::{
    consensus::{
        SignableTransaction, Signed, TxEip4844, TxEip4844Variant, TxEip4844WithSidecar, TxEnvelope,
    },
    eips::{eip2718::Encodable2718, eip2930::AccessList, eip4844::BlobTransactionSidecar},
    network::TxSigner,
    primitives::{Address, Bytes, PrimitiveSignature, TxHash},
};
use blobtx_eip4844::{check_payload_len, Blobs};
use tracing::{debug, error, info, instrument};

/// A signed blob transaction. The signature covers the transaction body only, the sidecar
/// travels alongside it.
pub type SignedBlobTx = Signed<TxEip4844Variant>;

/// Builds blob transactions from [`BlobTxRequest`]s using chain state from `C`.
///
/// The transactor holds no mutable state and can be shared across tasks. Each call fetches
/// fresh chain state.
#[derive(Debug)]
pub struct BlobTransactor<C> {
    client: C,
    blobs: Blobs,
    fallback_excess_blob_gas: u64,
}

impl<C: BlobTxClient> BlobTransactor<C> {
    /// Create a new [Self] with the default KZG trusted setup.
    pub fn new(client: C, config: &BlobTxConfig) -> Self {
        Self::with_blobs(client, Blobs::default(), config)
    }

    /// Create a new [Self] with a specific sidecar builder.
    pub const fn with_blobs(client: C, blobs: Blobs, config: &BlobTxConfig) -> Self {
        Self { client, blobs, fallback_excess_blob_gas: config.fallback_excess_blob_gas }
    }

    /// The chain client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Build, sign and, unless `no_send` is set, broadcast a blob transaction.
    ///
    /// If broadcasting fails the signed transaction is returned inside
    /// [`Error::SubmissionFailed`] so it can be passed to [`Self::resubmit`].
    #[instrument(
        skip_all,
        fields(to = ?request.to, payload_len = request.blob_data.len(), no_send = request.no_send),
        err
    )]
    pub async fn transact<S>(&self, request: BlobTxRequest<S>) -> Result<SignedBlobTx, Error>
    where
        S: TxSigner<PrimitiveSignature> + Send + Sync,
    {
        let signer = request.signer.as_ref().ok_or(Error::NoSigner)?;
        let from = signer.address();

        let tx = self.assemble(from, &request).await?;
        let mut tx = TxEip4844Variant::from(tx);
        let signature = signer.sign_transaction(&mut tx).await.map_err(Error::SigningFailed)?;
        let signed = tx.into_signed(signature);

        info!(tx_hash = %signed.hash(), %from, "signed blob tx");

        if request.no_send {
            return Ok(signed);
        }

        match self.broadcast(&signed).await {
            Ok(_) => Ok(signed),
            Err(source) => Err(Error::SubmissionFailed { tx: Box::new(signed), source }),
        }
    }

    /// Broadcast an already signed transaction again, e.g. after [`Error::SubmissionFailed`].
    #[instrument(skip_all, fields(tx_hash = %tx.hash()), err)]
    pub async fn resubmit(&self, tx: &SignedBlobTx) -> Result<TxHash, Error> {
        self.broadcast(tx)
            .await
            .map_err(|source| Error::SubmissionFailed { tx: Box::new(tx.clone()), source })
    }

    /// Assemble an unsigned blob transaction from `request`, sent by `from`.
    ///
    /// The payload size is checked before any network call. Fees are resolved and their
    /// ordering validated next, so an invalid request never reaches gas estimation. Gas
    /// estimation, nonce and chain id lookups then run concurrently with the KZG work.
    pub async fn assemble<S>(
        &self,
        from: Address,
        request: &BlobTxRequest<S>,
    ) -> Result<TxEip4844WithSidecar, Error> {
        check_payload_len(request.blob_data.len())?;

        let header = self.client.latest_header().await.map_err(Error::ChainStateFetchFailed)?;
        let fees = fees::resolve_fees(
            &self.client,
            &header,
            request.fee_overrides(),
            self.fallback_excess_blob_gas,
        )
        .await?;

        let to = request.to.unwrap_or_default();
        let (sidecar, gas_limit, nonce, chain_id) = tokio::try_join!(
            build_sidecar(self.blobs.clone(), request.blob_data.clone()),
            self.gas_limit(from, to, &fees, request),
            nonce::resolve_nonce(&self.client, from, request.nonce),
            self.chain_id(),
        )?;

        let blob_versioned_hashes = sidecar.versioned_hashes().collect();
        let tx = TxEip4844 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: fees.fee_cap,
            max_priority_fee_per_gas: fees.tip_cap,
            to,
            value: request.value.unwrap_or_default(),
            access_list: AccessList::default(),
            blob_versioned_hashes,
            max_fee_per_blob_gas: fees.blob_fee_cap,
            input: request.input.clone(),
        };
        debug!(chain_id, nonce, gas_limit, %to, "assembled blob tx");

        Ok(TxEip4844WithSidecar::from_tx_and_sidecar(tx, sidecar))
    }

    async fn gas_limit<S>(
        &self,
        from: Address,
        to: Address,
        fees: &FeeParams,
        request: &BlobTxRequest<S>,
    ) -> Result<u64, Error> {
        if let Some(gas_limit) = request.gas_limit {
            return Ok(gas_limit);
        }

        let query = GasQuery {
            from,
            to,
            tip_cap: fees.tip_cap,
            fee_cap: fees.fee_cap,
            input: request.input.clone(),
        };
        self.client.estimate_gas(query).await.map_err(Error::GasEstimationFailed)
    }

    async fn chain_id(&self) -> Result<u64, Error> {
        self.client.chain_id().await.map_err(Error::ChainStateFetchFailed)
    }

    async fn broadcast(
        &self,
        tx: &SignedBlobTx,
    ) -> alloy::transports::TransportResult<TxHash> {
        match self.client.broadcast(encode_network(tx)).await {
            Ok(hash) => {
                info!(%hash, "blob tx broadcast");
                Ok(hash)
            }
            Err(err) => {
                error!(?err, tx_hash = %tx.hash(), "blob tx broadcast failure");
                Err(err)
            }
        }
    }
}

/// EIP-2718 network encoding of a signed blob transaction, with its sidecar.
pub fn encode_network(tx: &SignedBlobTx) -> Bytes {
    TxEnvelope::from(tx.clone()).encoded_2718().into()
}

async fn build_sidecar(blobs: Blobs, payload: Bytes) -> Result<BlobTransactionSidecar, Error> {
    let sidecar = tokio::task::spawn_blocking(move || blobs.sidecar_from_bytes(&payload)).await??;
    Ok(sidecar)
}
