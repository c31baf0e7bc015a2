// Blockchain module
//
// This module contains the core ledger implementation including:
// - Block structure and hashing
// - Blockchain structure with the transaction pool
// - Transaction structure, signing and verification
// - Proof of work search
// - Wallets and address derivation

pub mod block;
pub mod chain;
pub mod crypto;
pub mod pow;
pub mod transaction;
pub mod wallet;

// Re-export main components for easier access
pub use block::{Block, BlockHash};
pub use chain::{Blockchain, BlockchainError, MINING_REWARD};
pub use crypto::{Address, AddressChecksum, CryptoError, TransactionSignature};
pub use pow::{ProofOfWork, MINING_DIFFICULTY};
pub use transaction::{Transaction, TransactionError, MINING_SENDER};
pub use wallet::Wallet;
