use log::debug;
use thiserror::Error;

use super::block::{self, BlockHash};
use super::transaction::Transaction;

/// Default number of leading zero hex characters a block hash needs
pub const MINING_DIFFICULTY: usize = 3;

/// A SHA-256 digest renders as 64 hex characters
const MAX_DIFFICULTY: usize = 64;

/// Errors that can occur during the proof of work search
#[derive(Debug, Error)]
pub enum ProofOfWorkError {
    #[error("Difficulty {0} exceeds the 64 hex characters of a block hash")]
    InvalidDifficulty(usize),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Nonce search over candidate blocks
///
/// Candidates are hashed with a zero timestamp so that a nonce found here can be checked again
/// later from the committed block's nonce, previous hash and transactions alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork {
            difficulty: MINING_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<Self, ProofOfWorkError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ProofOfWorkError::InvalidDifficulty(difficulty));
        }

        Ok(ProofOfWork { difficulty })
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Checks whether `nonce` gives the candidate block a hash with enough leading zeros
    pub fn is_valid_proof(
        &self,
        nonce: u64,
        previous_hash: &BlockHash,
        transactions: &[Transaction],
    ) -> Result<bool, ProofOfWorkError> {
        let hash = block::hash_parts(0, nonce, previous_hash, transactions)?;
        let encoded = hex::encode(hash);

        Ok(encoded.bytes().take(self.difficulty).all(|c| c == b'0'))
    }

    /// Returns the smallest nonce that satisfies [`ProofOfWork::is_valid_proof`]
    ///
    /// The search is sequential and unbounded. Expected cost is `16^difficulty` hashes.
    pub fn solve(
        &self,
        previous_hash: &BlockHash,
        transactions: &[Transaction],
    ) -> Result<u64, ProofOfWorkError> {
        let mut nonce = 0;

        while !self.is_valid_proof(nonce, previous_hash, transactions)? {
            nonce += 1;
        }

        debug!(
            "Found proof {} at difficulty {} after {} attempts",
            nonce,
            self.difficulty,
            nonce + 1
        );

        Ok(nonce)
    }
}
