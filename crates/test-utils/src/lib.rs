//! Utilities for setting up tests.

use alloy::{
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, Bytes, TxHash},
    signers::local::PrivateKeySigner,
    transports::{TransportErrorKind, TransportResult},
};
use blobtx::{BlobTxClient, ChainHeader, GasQuery, DEV_SECRET};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::{HashMap, HashSet},
    net::TcpListener,
};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Localhost IP address
pub const LOCALHOST: &str = "127.0.0.1";

/// Bytes per blob field element.
const FIELD_ELEMENT_BYTES: usize = 32;

/// Initialize a tracing subscriber for tests. Use `RUSTLOG` to set the filter level.
///
/// If the tracing subscriber has already been initialized in a previous test, this
/// function will silently fail due to `try_init()`, which does not reinitialize
/// the subscriber if one is already set.
pub fn test_tracing() {
    let filter =
        EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    let _ =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Find a free port on localhost.
pub fn get_localhost_port() -> u16 {
    let mut rng = rand::thread_rng();

    for _ in 0..64 {
        let port = rng.gen_range(49152..65535);
        if TcpListener::bind((LOCALHOST, port)).is_ok() {
            return port;
        }
    }

    panic!("no port found after 64 attempts");
}

/// Spin up an anvil instance on the cancun hardfork. Blocks are mined on every transaction.
pub fn anvil_cancun(port: u16) -> AnvilInstance {
    Anvil::new().port(port).args(["--hardfork", "cancun"]).try_spawn().unwrap()
}

/// Signer for the first anvil dev account.
pub fn dev_signer() -> PrivateKeySigner {
    DEV_SECRET.parse().expect("dev private key is valid")
}

/// Random payload of `len` bytes that is safe to copy into a blob as is: the first byte of every
/// 32 byte field element is zero.
pub fn canonical_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|i| if i % FIELD_ELEMENT_BYTES == 0 { 0 } else { rng.gen() }).collect()
}

/// Methods of [`BlobTxClient`], used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    /// [`BlobTxClient::latest_header`]
    LatestHeader,
    /// [`BlobTxClient::suggest_tip_cap`]
    SuggestTipCap,
    /// [`BlobTxClient::estimate_gas`]
    EstimateGas,
    /// [`BlobTxClient::pending_nonce`]
    PendingNonce,
    /// [`BlobTxClient::chain_id`]
    ChainId,
    /// [`BlobTxClient::broadcast`]
    Broadcast,
}

/// In memory [`BlobTxClient`] that records every call.
#[derive(Debug)]
pub struct MockChainClient {
    /// Header returned by `latest_header`.
    pub header: ChainHeader,
    /// Suggested tip cap.
    pub tip_cap: u128,
    /// Gas estimate.
    pub gas_estimate: u64,
    /// Pending nonce, for every account.
    pub pending_nonce: u64,
    /// Chain id.
    pub chain_id: u64,
    failing: HashSet<MockCall>,
    calls: Mutex<HashMap<MockCall, usize>>,
    gas_queries: Mutex<Vec<GasQuery>>,
    nonce_queries: Mutex<Vec<Address>>,
    broadcasts: Mutex<Vec<Bytes>>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self {
            header: ChainHeader { base_fee: 7, excess_blob_gas: Some(0) },
            tip_cap: 1_000_000_000,
            gas_estimate: 21_000,
            pending_nonce: 3,
            chain_id: 31337,
            failing: HashSet::new(),
            calls: Mutex::new(HashMap::new()),
            gas_queries: Mutex::new(Vec::new()),
            nonce_queries: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }
}

impl MockChainClient {
    /// Create a new [Self] with default chain state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Header returned by `latest_header`.
    pub const fn with_header(mut self, header: ChainHeader) -> Self {
        self.header = header;
        self
    }

    /// Make `call` return an error.
    pub fn failing(mut self, call: MockCall) -> Self {
        self.failing.insert(call);
        self
    }

    /// Stop failing `call`.
    pub fn recover(&mut self, call: MockCall) {
        self.failing.remove(&call);
    }

    /// Number of times `call` was issued.
    pub fn calls(&self, call: MockCall) -> usize {
        self.calls.lock().get(&call).copied().unwrap_or_default()
    }

    /// Total number of calls issued.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Every gas estimation query, in order.
    pub fn gas_queries(&self) -> Vec<GasQuery> {
        self.gas_queries.lock().clone()
    }

    /// Every account a pending nonce was requested for, in order.
    pub fn nonce_queries(&self) -> Vec<Address> {
        self.nonce_queries.lock().clone()
    }

    /// Every raw transaction broadcast, in order. Failed broadcasts are included.
    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.broadcasts.lock().clone()
    }

    fn record(&self, call: MockCall) -> TransportResult<()> {
        *self.calls.lock().entry(call).or_default() += 1;
        if self.failing.contains(&call) {
            return Err(TransportErrorKind::custom_str(&format!("mock failure: {call:?}")));
        }
        Ok(())
    }
}

impl BlobTxClient for MockChainClient {
    async fn latest_header(&self) -> TransportResult<ChainHeader> {
        self.record(MockCall::LatestHeader)?;
        Ok(self.header)
    }

    async fn suggest_tip_cap(&self) -> TransportResult<u128> {
        self.record(MockCall::SuggestTipCap)?;
        Ok(self.tip_cap)
    }

    async fn estimate_gas(&self, query: GasQuery) -> TransportResult<u64> {
        self.gas_queries.lock().push(query);
        self.record(MockCall::EstimateGas)?;
        Ok(self.gas_estimate)
    }

    async fn pending_nonce(&self, account: Address) -> TransportResult<u64> {
        self.nonce_queries.lock().push(account);
        self.record(MockCall::PendingNonce)?;
        Ok(self.pending_nonce)
    }

    async fn chain_id(&self) -> TransportResult<u64> {
        self.record(MockCall::ChainId)?;
        Ok(self.chain_id)
    }

    async fn broadcast(&self, raw: Bytes) -> TransportResult<TxHash> {
        self.broadcasts.lock().push(raw.clone());
        self.record(MockCall::Broadcast)?;
        Ok(alloy::primitives::keccak256(&raw))
    }
}
