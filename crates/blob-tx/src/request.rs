//! Caller facing description of a blob transaction.

use crate::fees::FeeOverrides;
use alloy::primitives::{Address, Bytes, U256};

/// A request to build, sign and optionally send a blob transaction.
///
/// Every field except the blob payload is optional; missing values are resolved from the
/// chain. Built with [`BlobTxRequest::new`] and the setter methods.
#[derive(Debug, Clone)]
pub struct BlobTxRequest<S> {
    /// Recipient. Normalized to [`Address::ZERO`] when absent.
    pub to: Option<Address>,
    /// Transaction input (calldata).
    pub input: Bytes,
    /// Raw payload carried in the blob.
    pub blob_data: Bytes,
    /// Explicit max priority fee per gas.
    pub tip_cap: Option<u128>,
    /// Explicit max fee per gas.
    pub fee_cap: Option<u128>,
    /// Explicit gas limit.
    pub gas_limit: Option<u64>,
    /// Explicit nonce.
    pub nonce: Option<u64>,
    /// Value to transfer. Normalized to zero when absent.
    pub value: Option<U256>,
    /// Sign the transaction but do not broadcast it.
    pub no_send: bool,
    /// Signer authorizing the transaction.
    pub signer: Option<S>,
}

impl<S> BlobTxRequest<S> {
    /// Create a new [Self] carrying `blob_data`, with everything else left to be resolved.
    pub fn new(blob_data: impl Into<Bytes>) -> Self {
        Self {
            to: None,
            input: Bytes::new(),
            blob_data: blob_data.into(),
            tip_cap: None,
            fee_cap: None,
            gas_limit: None,
            nonce: None,
            value: None,
            no_send: false,
            signer: None,
        }
    }

    /// Specify the signer.
    pub fn signer(mut self, signer: S) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Specify the recipient.
    pub const fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Specify the transaction input.
    pub fn input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = input.into();
        self
    }

    /// Specify the max priority fee per gas.
    pub const fn tip_cap(mut self, tip_cap: u128) -> Self {
        self.tip_cap = Some(tip_cap);
        self
    }

    /// Specify the max fee per gas.
    pub const fn fee_cap(mut self, fee_cap: u128) -> Self {
        self.fee_cap = Some(fee_cap);
        self
    }

    /// Specify the gas limit.
    pub const fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Specify the nonce.
    pub const fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Specify the value.
    pub const fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Sign only, do not broadcast.
    pub const fn no_send(mut self, no_send: bool) -> Self {
        self.no_send = no_send;
        self
    }

    pub(crate) const fn fee_overrides(&self) -> FeeOverrides {
        FeeOverrides { tip_cap: self.tip_cap, fee_cap: self.fee_cap }
    }
}
