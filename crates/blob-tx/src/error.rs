//! Errors from building and submitting blob transactions.

use crate::transactor::SignedBlobTx;
use alloy::transports::TransportError;

/// Blob transaction errors. None of these are retried internally.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// request did not carry a signer
    #[error("no signer to authorize the transaction with")]
    NoSigner,
    /// fee cap is below the tip cap
    #[error("maxFeePerGas ({fee_cap}) < maxPriorityFeePerGas ({tip_cap})")]
    InvalidFeeOrdering {
        /// resolved max fee per gas
        fee_cap: u128,
        /// resolved max priority fee per gas
        tip_cap: u128,
    },
    /// blob payload does not fit in a single blob
    #[error("payload of {len} bytes exceeds the blob capacity of {max} bytes")]
    PayloadTooLarge {
        /// length of the payload
        len: usize,
        /// blob capacity
        max: usize,
    },
    /// error computing the blob commitment or proof
    #[error("failed to build blob sidecar: {0}")]
    SidecarConstructionFailed(blobtx_eip4844::Error),
    /// the blocking sidecar task panicked or was cancelled
    #[error("sidecar task failed: {0}")]
    SidecarTask(#[from] tokio::task::JoinError),
    /// error fetching the account nonce
    #[error("failed to resolve nonce: {0}")]
    NonceResolutionFailed(TransportError),
    /// error fetching the header, tip cap or chain id
    #[error("failed to fetch chain state: {0}")]
    ChainStateFetchFailed(TransportError),
    /// error estimating gas
    #[error("failed to estimate gas: {0}")]
    GasEstimationFailed(TransportError),
    /// the signer failed to sign the transaction
    #[error("failed to sign transaction: {0}")]
    SigningFailed(alloy::signers::Error),
    /// broadcasting the signed transaction failed. The signed transaction is returned so it
    /// can be resubmitted without signing again.
    #[error("failed to submit transaction {}: {source}", .tx.hash())]
    SubmissionFailed {
        /// the signed transaction that failed to broadcast
        tx: Box<SignedBlobTx>,
        /// underlying rpc error
        source: TransportError,
    },
}

impl From<blobtx_eip4844::Error> for Error {
    fn from(error: blobtx_eip4844::Error) -> Self {
        match error {
            blobtx_eip4844::Error::PayloadTooLarge { len, max } => Self::PayloadTooLarge { len, max },
            other => Self::SidecarConstructionFailed(other),
        }
    }
}

impl Error {
    /// The signed transaction, if the error happened after signing.
    pub fn signed_tx(&self) -> Option<&SignedBlobTx> {
        match self {
            Self::SubmissionFailed { tx, .. } => Some(tx.as_ref()),
            _ => None,
        }
    }
}
