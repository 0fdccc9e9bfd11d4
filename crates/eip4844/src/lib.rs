//! Helpers for constructing eip4844 blob sidecars.
//!
//! ref: https://github.com/ethereum/consensus-specs/blob/86fb82b221474cc89387fa6436806507b3849d88/specs/deneb/polynomial-commitments.md
// ref: https://github.com/paradigmxyz/reth/blob/bc43613be35f316304f7ce4a2225855ac26b5923/crates/primitives/src/transaction/sidecar.rs#L254-L256
//
// Payload bytes are copied into the blob as is, without a coder. Every 32 byte field element of
// the payload therefore has to be below the BLS12-381 scalar modulus, otherwise commitment
// generation fails.

use alloy::{
    consensus::EnvKzgSettings,
    eips::eip4844::{
        kzg_to_versioned_hash, Blob, BlobTransactionSidecar, Bytes48, BYTES_PER_BLOB,
    },
    primitives::B256,
};
use tracing::debug;

/// Max number of payload bytes that fit in a single blob (128KiB).
pub const BLOB_CAPACITY: usize = BYTES_PER_BLOB;

/// Errors for this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// payload does not fit in a blob
    #[error("payload of {len} bytes is bigger than the blob capacity of {max} bytes")]
    PayloadTooLarge {
        /// length of the payload
        len: usize,
        /// blob capacity
        max: usize,
    },
    /// kzg blobs error
    #[error("kzg blobs: {0}")]
    Kzg(#[from] c_kzg::Error),
    /// error generating a kzg proof for a blob
    #[error("error generating blob proof: {0}")]
    ProofGen(c_kzg::Error),
    /// error generating a commitment to a blob
    #[error("error generating blob commitment: {0}")]
    CommitmentGen(c_kzg::Error),
    /// error while verifying a blob proof
    #[error("error verifying blob proof: {0}")]
    Verification(c_kzg::Error),
    /// blob proof did not verify
    #[error("invalid kzg proof for blob {index}")]
    InvalidProof {
        /// index of the blob in the sidecar
        index: usize,
    },
    /// versioned hash does not match the commitment
    #[error("versioned hash mismatch for blob {index}")]
    VersionedHashMismatch {
        /// index of the blob in the sidecar
        index: usize,
    },
    /// sidecar lists and versioned hashes have inconsistent lengths
    #[error(
        "sidecar length mismatch: blobs={blobs}, commitments={commitments}, proofs={proofs}, hashes={hashes}"
    )]
    LengthMismatch {
        /// number of blobs
        blobs: usize,
        /// number of commitments
        commitments: usize,
        /// number of proofs
        proofs: usize,
        /// number of versioned hashes
        hashes: usize,
    },
}

/// Check that a payload of `len` bytes fits into a single blob.
pub const fn check_payload_len(len: usize) -> Result<(), Error> {
    if len > BLOB_CAPACITY {
        return Err(Error::PayloadTooLarge { len, max: BLOB_CAPACITY });
    }
    Ok(())
}

/// Eip4844 sidecar generation and verification.
#[derive(Debug, Clone, Default)]
pub struct Blobs {
    kzg_settings: EnvKzgSettings,
}

impl Blobs {
    /// Create a new instance of [`Self`].
    pub const fn new(kzg_settings: EnvKzgSettings) -> Self {
        Self { kzg_settings }
    }

    /// Build a sidecar holding exactly one blob with `payload` at the front and a zero padded
    /// tail.
    ///
    /// Note that this function computes a KZG commitment and proof. This is likely pretty slow
    /// and thus should be handled appropriately in a tokio runtime.
    pub fn sidecar_from_bytes(&self, payload: &[u8]) -> Result<BlobTransactionSidecar, Error> {
        self.sidecar_from_chunks(&[payload])
    }

    /// Build a sidecar with one blob per chunk, in order. Each chunk is independently capped
    /// at [`BLOB_CAPACITY`].
    pub fn sidecar_from_chunks(
        &self,
        chunks: &[&[u8]],
    ) -> Result<BlobTransactionSidecar, Error> {
        // Check every chunk up front so we don't do any kzg work for a request that will fail.
        for chunk in chunks {
            check_payload_len(chunk.len())?;
        }

        let settings = self.kzg_settings.get();
        let mut blobs = Vec::with_capacity(chunks.len());
        let mut commitments = Vec::with_capacity(chunks.len());
        let mut proofs = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let (blob, commitment, proof) = chunk_to_blob(chunk, settings)?;
            blobs.push(blob);
            commitments.push(commitment);
            proofs.push(proof);
        }

        debug!(blobs = blobs.len(), "built blob sidecar");

        Ok(BlobTransactionSidecar::new(blobs, commitments, proofs))
    }

    /// Verify every blob in the sidecar against its commitment and proof, and that
    /// `versioned_hashes` are derived from the commitments.
    pub fn verify_sidecar(
        &self,
        sidecar: &BlobTransactionSidecar,
        versioned_hashes: &[B256],
    ) -> Result<(), Error> {
        let blobs = sidecar.blobs.len();
        if sidecar.commitments.len() != blobs
            || sidecar.proofs.len() != blobs
            || versioned_hashes.len() != blobs
        {
            return Err(Error::LengthMismatch {
                blobs,
                commitments: sidecar.commitments.len(),
                proofs: sidecar.proofs.len(),
                hashes: versioned_hashes.len(),
            });
        }

        let settings = self.kzg_settings.get();
        let entries = sidecar.blobs.iter().zip(&sidecar.commitments).zip(&sidecar.proofs);
        for (index, ((blob, commitment), proof)) in entries.enumerate() {
            if kzg_to_versioned_hash(commitment.as_slice()) != versioned_hashes[index] {
                return Err(Error::VersionedHashMismatch { index });
            }

            let blob = c_kzg::Blob::from_bytes(blob.as_slice())?;
            let commitment = c_kzg::Bytes48::from_bytes(commitment.as_slice())?;
            let proof = c_kzg::Bytes48::from_bytes(proof.as_slice())?;
            let valid = c_kzg::KzgProof::verify_blob_kzg_proof(&blob, &commitment, &proof, settings)
                .map_err(Error::Verification)?;
            if !valid {
                return Err(Error::InvalidProof { index });
            }
        }

        Ok(())
    }
}

fn chunk_to_blob(
    chunk: &[u8],
    settings: &c_kzg::KzgSettings,
) -> Result<(Blob, Bytes48, Bytes48), Error> {
    // Zero filled blob with the chunk copied to the front, leaving the back zero padded.
    let mut blob = Blob::ZERO;
    blob[..chunk.len()].copy_from_slice(chunk);

    let kzg_blob = c_kzg::Blob::from_bytes(blob.as_slice())?;
    let commitment = c_kzg::KzgCommitment::blob_to_kzg_commitment(&kzg_blob, settings)
        .map_err(Error::CommitmentGen)?
        .to_bytes();
    let proof = c_kzg::KzgProof::compute_blob_kzg_proof(&kzg_blob, &commitment, settings)
        .map_err(Error::ProofGen)?
        .to_bytes();

    Ok((blob, Bytes48::from(*commitment), Bytes48::from(*proof)))
}
