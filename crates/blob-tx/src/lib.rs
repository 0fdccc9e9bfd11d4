//! Construct, sign and submit EIP-4844 blob transactions.
//!
//! The [`BlobTransactor`] takes a [`BlobTxRequest`] carrying a raw payload and turns it into a
//! priced, chain bound, signed type 3 transaction with a single blob sidecar. Chain state is read
//! through an injected [`BlobTxClient`], so the engine itself holds no state across calls.

pub mod client;
pub mod config;
pub mod error;
pub mod fees;
pub mod nonce;
pub mod request;
pub mod rpc;
pub mod transactor;

pub use blobtx_eip4844::{Blobs, BLOB_CAPACITY};
pub use client::{BlobTxClient, ChainHeader, GasQuery};
pub use config::BlobTxConfig;
pub use error::Error;
pub use fees::FeeParams;
pub use request::BlobTxRequest;
pub use rpc::RpcBlobTxClient;
pub use transactor::{BlobTransactor, SignedBlobTx};

/// Private key of the first anvil dev account. Only for local development and tests.
pub const DEV_SECRET: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
