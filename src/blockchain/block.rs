use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// SHA-256 digest of a block's JSON encoding
pub type BlockHash = [u8; 32];

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Creation time in nanoseconds since the Unix epoch
    pub timestamp: i64,

    /// Proof of work (nonce)
    pub nonce: u64,

    /// Hash of the previous block
    #[serde(with = "hex_hash")]
    #[schema(value_type = String, example = "000a3f...")]
    pub previous_hash: BlockHash,

    /// Transactions included in this block, in order
    pub transactions: Vec<Transaction>,
}

/// Borrowed view with the same encoding as [`Block`], so candidates can be hashed without cloning
#[derive(Serialize)]
struct BlockRef<'a> {
    timestamp: i64,
    nonce: u64,
    #[serde(with = "hex_hash")]
    previous_hash: BlockHash,
    transactions: &'a [Transaction],
}

impl Block {
    /// Creates a new block stamped with the current time
    pub fn new(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Block {
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The zero-valued block whose hash seeds the genesis block
    pub fn zero() -> Self {
        Block {
            timestamp: 0,
            nonce: 0,
            previous_hash: [0; 32],
            transactions: Vec::new(),
        }
    }

    /// Calculates the SHA-256 hash of the block
    pub fn hash(&self) -> Result<BlockHash, serde_json::Error> {
        hash_parts(self.timestamp, self.nonce, &self.previous_hash, &self.transactions)
    }
}

/// Hashes the encoding of a block assembled from its parts
pub fn hash_parts(
    timestamp: i64,
    nonce: u64,
    previous_hash: &BlockHash,
    transactions: &[Transaction],
) -> Result<BlockHash, serde_json::Error> {
    let block = BlockRef {
        timestamp,
        nonce,
        previous_hash: *previous_hash,
        transactions,
    };

    let encoded = serde_json::to_vec(&block)?;
    Ok(Sha256::digest(encoded).into())
}

mod hex_hash {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::BlockHash;

    pub fn serialize<S: Serializer>(hash: &BlockHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BlockHash, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(D::Error::custom)?;

        bytes
            .try_into()
            .map_err(|_| D::Error::custom("previous_hash must be 32 bytes"))
    }
}
