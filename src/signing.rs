//! Ed25519 signatures over records and chunks.
//!
//! A record is signed over [`Artifact::signing_preimage`], a chunk over
//! [`Multipart::signing_preimage`]. Signatures travel base64-encoded; the
//! publishing address of an [`Ed25519Signer`] is the SHA-256 fingerprint of
//! its verifying key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::artifact::Artifact;
use oip_wire::{ErrorCode, Multipart};

/// Errors from signing/verification operations
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("record is not signed")]
    Unsigned,
}

impl SigningError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::MalformedInput
    }
}

pub type SigningResult<T> = Result<T, SigningError>;

/// Something that can sign on behalf of a publishing address.
pub trait RecordSigner: Send + Sync {
    /// Address the signatures are attributed to.
    fn address(&self) -> String;

    /// Base64 signature over `message`.
    fn sign(&self, message: &[u8]) -> String;
}

/// In-process Ed25519 key.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    /// Decode a base64 secret key.
    pub fn from_base64(encoded: &str) -> SigningResult<Self> {
        let bytes = STANDARD.decode(encoded)?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SigningError::InvalidKey("key must be 32 bytes".to_string()))?;
        Ok(Self::from_bytes(&secret))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl RecordSigner for Ed25519Signer {
    fn address(&self) -> String {
        key_fingerprint(&self.key.verifying_key())
    }

    fn sign(&self, message: &[u8]) -> String {
        STANDARD.encode(self.key.sign(message).to_bytes())
    }
}

/// SHA-256 fingerprint of an Ed25519 public key.
pub fn key_fingerprint(key: &VerifyingKey) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Decode a base64 verifying key.
pub fn decode_verifying_key(encoded: &str) -> SigningResult<VerifyingKey> {
    let bytes = STANDARD.decode(encoded)?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| SigningError::InvalidKey("key must be 32 bytes".to_string()))?;
    VerifyingKey::from_bytes(&key).map_err(|e| SigningError::InvalidKey(e.to_string()))
}

/// Check a base64 signature over `message`.
///
/// A well-formed signature that does not verify yields `Ok(false)`.
pub fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> SigningResult<bool> {
    let bytes = STANDARD.decode(signature_b64)?;
    let signature = Signature::from_slice(&bytes)
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
    Ok(key.verify(message, &signature).is_ok())
}

/// Verify the record signature of `artifact`.
pub fn verify_record(key: &VerifyingKey, artifact: &Artifact) -> SigningResult<bool> {
    let signature = artifact.signature().ok_or(SigningError::Unsigned)?;
    verify_signature(key, artifact.signing_preimage().as_bytes(), signature)
}

/// Verify the signature carried by one chunk.
pub fn verify_multipart(key: &VerifyingKey, part: &Multipart) -> SigningResult<bool> {
    let signature = part.signature.as_deref().ok_or(SigningError::Unsigned)?;
    verify_signature(key, part.signing_preimage().as_bytes(), signature)
}
