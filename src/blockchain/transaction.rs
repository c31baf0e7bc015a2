use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;

use super::crypto::{CryptoError, TransactionSignature};

/// Sender of mining rewards. Transactions from it are admitted without a signature.
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Transaction not signed")]
    MissingSignature,

    #[error("Sender public key missing")]
    MissingPublicKey,

    #[error("Invalid value: {0}")]
    InvalidValue(f32),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A value transfer between two addresses
///
/// Field order is part of the canonical encoding and therefore of every signature and block hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address
    #[serde(rename = "send_blockchain_adress")]
    pub sender: String,

    /// Recipient's address
    #[serde(rename = "recipient_blockchain_address")]
    pub recipient: String,

    /// Amount being transferred
    pub value: f32,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: f32) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
        }
    }

    /// Creates a mining reward paid by [`MINING_SENDER`]
    pub fn new_reward(recipient: impl Into<String>, value: f32) -> Self {
        Transaction::new(MINING_SENDER, recipient, value)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == MINING_SENDER
    }

    /// Rejects values that have no JSON number encoding
    pub fn check_value(&self) -> Result<(), TransactionError> {
        if self.value.is_finite() {
            Ok(())
        } else {
            Err(TransactionError::InvalidValue(self.value))
        }
    }

    /// Canonical encoding used for signing
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// SHA-256 of the canonical encoding
    pub fn digest(&self) -> Result<[u8; 32], TransactionError> {
        Ok(Sha256::digest(self.to_bytes()?).into())
    }

    /// Signs the transaction digest with ECDSA
    pub fn sign(&self, private_key: &SigningKey) -> Result<TransactionSignature, TransactionError> {
        let digest = self.digest()?;

        let signature: Signature = private_key
            .sign_prehash(&digest)
            .map_err(|e| CryptoError::SigningError(e.to_string()))?;

        Ok(TransactionSignature::from_signature(&signature))
    }

    /// Checks `signature` over the transaction digest under `public_key`
    ///
    /// A well-formed signature that does not match yields `Ok(false)`; a signature that cannot
    /// be decoded at all is an error.
    pub fn verify_signature(
        &self,
        public_key: &VerifyingKey,
        signature: &TransactionSignature,
    ) -> Result<bool, TransactionError> {
        let signature = signature.to_signature()?;
        let digest = self.digest()?;

        Ok(public_key.verify_prehash(&digest, &signature).is_ok())
    }
}
