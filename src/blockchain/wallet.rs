use p256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use std::fmt;

use super::crypto::{public_key_to_hex, Address, CryptoError, TransactionSignature};
use super::transaction::{Transaction, TransactionError};

/// A P-256 keypair and the address derived from it
///
/// The private key never leaves the wallet except through [`Wallet::private_key_str`].
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn generate() -> Self {
        Wallet::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Rebuilds a wallet from a 32-byte private key in hex
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(private_key.trim())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        Ok(Wallet::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Private key as 64 lowercase hex characters, for display only
    pub fn private_key_str(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Public key as `x || y` in lowercase hex, for display only
    pub fn public_key_str(&self) -> String {
        public_key_to_hex(&self.verifying_key)
    }

    /// Builds a transaction from this wallet's address and signs it
    pub fn sign_transaction(
        &self,
        recipient: &str,
        value: f32,
    ) -> Result<(Transaction, TransactionSignature), TransactionError> {
        let transaction = Transaction::new(self.address.as_str(), recipient, value);
        transaction.check_value()?;
        let signature = transaction.sign(&self.signing_key)?;

        Ok((transaction, signature))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("public_key", &self.public_key_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::public_key_from_hex;

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::generate();

        assert!(!wallet.address().0.is_empty());
        assert_eq!(wallet.private_key_str().len(), 64);
        assert_eq!(wallet.public_key_str().len(), 128);
        assert_eq!(wallet.address(), &Address::from_public_key(wallet.public_key()));
    }

    #[test]
    fn test_wallets_are_distinct() {
        let first = Wallet::generate();
        let second = Wallet::generate();

        assert_ne!(first.address(), second.address());
        assert_ne!(first.private_key_str(), second.private_key_str());
    }

    #[test]
    fn test_import_private_key() {
        let wallet = Wallet::generate();

        let restored = Wallet::from_private_key_hex(&wallet.private_key_str()).unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert_eq!(restored.public_key(), wallet.public_key());

        assert!(Wallet::from_private_key_hex("not hex").is_err());
        assert!(Wallet::from_private_key_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_sign_transaction() {
        let wallet = Wallet::generate();

        let (transaction, signature) = wallet.sign_transaction("recipient", 2.5).unwrap();
        assert_eq!(transaction.sender, wallet.address().0);

        let public_key = public_key_from_hex(&wallet.public_key_str()).unwrap();
        assert!(transaction.verify_signature(&public_key, &signature).unwrap());
    }

    #[test]
    fn test_sign_transaction_rejects_infinite_value() {
        let wallet = Wallet::generate();

        assert!(matches!(
            wallet.sign_transaction("recipient", f32::INFINITY),
            Err(TransactionError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let wallet = Wallet::generate();
        let rendered = format!("{:?}", wallet);

        assert!(rendered.contains(&wallet.address().0));
        assert!(!rendered.contains(&wallet.private_key_str()));
    }
}
