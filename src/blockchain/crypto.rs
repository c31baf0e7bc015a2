use p256::ecdsa::{Signature, VerifyingKey};
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;

use std::fmt;
use std::str::FromStr;

/// Version byte prefixed to every address payload
pub const ADDRESS_VERSION: u8 = 0x00;

/// Length of a decoded address: version byte, RIPEMD-160 hash and 4-byte checksum
pub const ADDRESS_PAYLOAD_LEN: usize = 25;

const CHECKSUM_LEN: usize = 4;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Failed to sign message: {0}")]
    SigningError(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Selects which digest the address checksum is taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressChecksum {
    /// `SHA256(SHA256(x || y))`, the digest of the public key itself.
    ///
    /// Addresses handed out by existing wallets use this form.
    #[default]
    FirstDigest,

    /// `SHA256(SHA256(version || ripemd160))`, standard Base58Check.
    VersionedPayload,
}

/// A wallet address: Base58 encoding of `version || RIPEMD160(SHA256(pubkey)) || checksum`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Address(pub String);

impl Address {
    /// Derives the address of a public key using the default checksum
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        Self::derive(public_key, AddressChecksum::default())
    }

    /// Derives the address of a public key with an explicit checksum mode
    pub fn derive(public_key: &VerifyingKey, checksum: AddressChecksum) -> Self {
        let point = public_key.to_encoded_point(false);
        let coordinates = point.as_bytes().get(1..).unwrap_or_default();
        let (x, y) = coordinates.split_at(coordinates.len() / 2);

        // Coordinates are hashed in their minimal big-endian form.
        let mut hasher = Sha256::new();
        hasher.update(strip_leading_zeros(x));
        hasher.update(strip_leading_zeros(y));
        let key_digest = hasher.finalize();

        let key_hash = Ripemd160::digest(&key_digest);

        let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_LEN);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&key_hash);

        let checksum_digest = match checksum {
            AddressChecksum::FirstDigest => Sha256::digest(&key_digest),
            AddressChecksum::VersionedPayload => Sha256::digest(Sha256::digest(&payload)),
        };
        payload.extend_from_slice(&checksum_digest[..CHECKSUM_LEN]);

        Address(bs58::encode(payload).into_string())
    }

    /// Decodes the address back to its 25-byte payload
    pub fn payload(&self) -> Result<Vec<u8>, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        if bytes.len() != ADDRESS_PAYLOAD_LEN {
            return Err(CryptoError::DecodingError(format!(
                "address payload must be {} bytes, got {}",
                ADDRESS_PAYLOAD_LEN,
                bytes.len()
            )));
        }

        Ok(bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address(s.to_string());
        address.payload()?;
        Ok(address)
    }
}

/// An ECDSA signature `(R, S)` rendered as 128 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionSignature(pub String);

impl TransactionSignature {
    pub fn from_signature(signature: &Signature) -> Self {
        TransactionSignature(hex::encode(signature.to_bytes()))
    }

    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes =
            hex::decode(&self.0).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        Signature::from_slice(&bytes).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signature = TransactionSignature(s.to_lowercase());
        signature.to_signature()?;
        Ok(signature)
    }
}

/// Renders a public key as `x || y`, 32 bytes each, in lowercase hex
pub fn public_key_to_hex(public_key: &VerifyingKey) -> String {
    let point = public_key.to_encoded_point(false);
    hex::encode(point.as_bytes().get(1..).unwrap_or_default())
}

/// Parses a public key from `x || y` hex, or from any hex SEC1 encoding
pub fn public_key_from_hex(encoded: &str) -> Result<VerifyingKey, CryptoError> {
    let mut bytes =
        hex::decode(encoded).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    if bytes.len() == 64 {
        bytes.insert(0, 0x04);
    }

    VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
