//! CLI for blobtx.

use alloy::{
    hex,
    primitives::{Address, Bytes, U256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
    transports::http::reqwest,
};
use blobtx::{
    config, transactor::encode_network, BlobTransactor, BlobTxConfig, BlobTxRequest,
    RpcBlobTxClient, DEV_SECRET,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const ENV_PRIVATE_KEY: &str = "BLOBTX_PRIVATE_KEY";

/// Errors from the blobtx CLI
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// private key was not set
    #[error("environment variable {} must be set, or specify signer subcommand", ENV_PRIVATE_KEY)]
    PrivKeyNotSet,
    /// failed to parse the given rpc url
    #[error("failed to parse rpc url")]
    RpcUrlParse,
    /// private key was not valid hex
    #[error("private key was not valid hex")]
    InvalidPrivateKeyHex(#[from] hex::FromHexError),
    /// private key hex was too short
    #[error("private key hex was too short")]
    ShortPrivateKeyHex,
    /// invalid private key
    #[error("invalid private key: {0}")]
    Ecdsa(#[from] k256::ecdsa::Error),
    /// errors from alloy signer local crate
    #[error(transparent)]
    SignerLocal(#[from] alloy::signers::local::LocalSignerError),
    /// failed to read the blob payload file
    #[error("failed to read blob file {path}: {source}")]
    BlobFile {
        /// path of the blob file
        path: PathBuf,
        /// underlying io error
        source: std::io::Error,
    },
    /// error loading the config file
    #[error(transparent)]
    Config(#[from] config::Error),
    /// error building or sending the blob transaction
    #[error(transparent)]
    BlobTx(#[from] blobtx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
#[command(version, about, long_about = None)]
enum SignerKey {
    /// Use a development key
    Dev,
    /// Use an encrypted keystore
    KeyStore(KeyStore),
    /// Pass the hex encoded secret in at the command line
    Secret(Secret),
}

#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
struct KeyStore {
    /// Path to JSON keystore
    #[arg(long, value_name = "FILE")]
    path: PathBuf,
    /// Password for decrypting the JSON keystore
    #[arg(long)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
struct Secret {
    secret: String,
}

fn default_config_path() -> Option<PathBuf> {
    let mut p = home::home_dir()?;
    p.push(".config");
    p.push("blobtx");
    p.push("config.toml");
    Some(p)
}

/// Build, sign and send a transaction carrying a blob.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Opts {
    /// HTTP Ethereum RPC address. Defaults to a local anvil node address.
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Recipient of the transaction. Defaults to the zero address.
    #[arg(long)]
    to: Option<Address>,

    /// Hex encoded transaction input.
    #[arg(long, value_parser = parse_hex_bytes)]
    input: Option<Bytes>,

    /// File whose contents are carried in the blob.
    #[arg(long, value_name = "FILE")]
    blob_file: PathBuf,

    /// Max priority fee per gas. Defaults to the node's suggestion.
    #[arg(long)]
    tip_cap: Option<u128>,

    /// Max fee per gas. Defaults to tip cap plus twice the base fee.
    #[arg(long)]
    fee_cap: Option<u128>,

    /// Gas limit. Defaults to the node's estimate.
    #[arg(long)]
    gas_limit: Option<u64>,

    /// Nonce. Defaults to the sender's pending nonce.
    #[arg(long)]
    nonce: Option<u64>,

    /// Value to transfer, in wei.
    #[arg(long)]
    value: Option<U256>,

    /// Sign the transaction and print it instead of broadcasting.
    #[arg(long)]
    no_send: bool,

    /// Path to a TOML config file. Defaults to ~/.config/blobtx/config.toml if it exists.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Key to sign with
    #[command(subcommand)]
    signer_key: Option<SignerKey>,
}

impl Opts {
    fn signer(&self) -> Result<PrivateKeySigner, Error> {
        let signer = match &self.signer_key {
            Some(SignerKey::Dev) => {
                info!("signing with development key");
                Self::signer_from_hex(DEV_SECRET)?
            }
            Some(SignerKey::KeyStore(KeyStore { path, password })) => {
                PrivateKeySigner::decrypt_keystore(path, password)?
            }
            Some(SignerKey::Secret(Secret { secret })) => Self::signer_from_hex(secret)?,
            None => {
                let secret = std::env::var(ENV_PRIVATE_KEY).map_err(|_| Error::PrivKeyNotSet)?;
                Self::signer_from_hex(&secret)?
            }
        };

        Ok(signer)
    }

    fn signer_from_hex(secret: &str) -> Result<PrivateKeySigner, Error> {
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        if secret.len() < 64 {
            return Err(Error::ShortPrivateKeyHex);
        }

        let decoded = hex::decode(secret)?;
        PrivateKeySigner::from_slice(&decoded).map_err(Into::into)
    }

    fn config(&self) -> Result<BlobTxConfig, Error> {
        match &self.config {
            Some(path) => Ok(BlobTxConfig::from_toml_file(path)?),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Ok(BlobTxConfig::from_toml_file(path)?),
                None => Ok(BlobTxConfig::default()),
            },
        }
    }

    fn request(
        &self,
        blob_data: Vec<u8>,
        signer: PrivateKeySigner,
    ) -> BlobTxRequest<PrivateKeySigner> {
        BlobTxRequest {
            to: self.to,
            input: self.input.clone().unwrap_or_default(),
            blob_data: blob_data.into(),
            tip_cap: self.tip_cap,
            fee_cap: self.fee_cap,
            gas_limit: self.gas_limit,
            nonce: self.nonce,
            value: self.value,
            no_send: self.no_send,
            signer: Some(signer),
        }
    }
}

fn parse_hex_bytes(s: &str) -> Result<Bytes, hex::FromHexError> {
    s.parse()
}

fn read_blob_file(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|source| Error::BlobFile { path: path.to_path_buf(), source })
}

/// Command line interface for sending blob transactions.
#[derive(Debug)]
pub struct Cli;

impl Cli {
    /// Run the CLI
    #[instrument]
    pub async fn run() -> Result<(), Error> {
        let opts = Opts::parse();

        let config = opts.config()?;
        let signer = opts.signer()?;
        let blob_data = read_blob_file(&opts.blob_file)?;

        let url: reqwest::Url = opts.rpc_url.parse().map_err(|_| Error::RpcUrlParse)?;
        info!(%url, from = %signer.address(), payload_len = blob_data.len(), "sending blob tx");

        let provider = ProviderBuilder::new().on_http(url);
        let client = RpcBlobTxClient::new(provider, config.rpc_timeout());
        let transactor = BlobTransactor::new(client, &config);

        let signed = transactor.transact(opts.request(blob_data, signer)).await?;

        println!("{}", signed.hash());
        if opts.no_send {
            println!("{}", hex::encode_prefixed(encode_network(&signed)));
        }

        Ok(())
    }
}
