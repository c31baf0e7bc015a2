use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{Block, Transaction};

/// The chain as served to other nodes and clients
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The blocks in the chain, genesis first
    pub chains: Vec<Block>,
}

/// Pending transactions
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PoolResponse {
    pub transactions: Vec<Transaction>,
    pub length: usize,
}

/// A transaction signed by the client
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    pub value: f32,

    /// The sender's public key, `x || y` in hex
    pub sender_public_key: String,

    /// ECDSA signature `r || s` in hex over the SHA-256 of the transaction
    pub signature: String,
}

/// A transaction to be signed by the server with the supplied key
#[derive(Serialize, Deserialize, ToSchema)]
pub struct WalletTransactionRequest {
    /// The sender's private key (hex encoded)
    pub sender_private_key: String,

    /// The sender's address, must match the private key
    pub sender_blockchain_address: String,

    /// The recipient's address
    pub recipient_blockchain_address: String,

    /// The amount to transfer
    pub value: f32,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    pub message: String,

    /// The newly mined block
    pub block: Block,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AmountResponse {
    pub address: String,

    /// Balance over all mined blocks
    pub amount: f32,
}

/// A freshly generated wallet. The private key is not stored by the server.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub private_key: String,
    pub public_key: String,
    pub blockchain_address: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
        }
    }
}
