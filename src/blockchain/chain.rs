use std::sync::Arc;

use log::{info, warn};
use p256::ecdsa::VerifyingKey;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::block::{Block, BlockHash};
use super::crypto::TransactionSignature;
use super::pow::{ProofOfWork, ProofOfWorkError};
use super::transaction::{Transaction, TransactionError};

/// Amount credited to the chain owner for every mined block
pub const MINING_REWARD: f32 = 1.0;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Proof of work error: {0}")]
    ProofOfWorkError(#[from] ProofOfWorkError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chain has no blocks")]
    ChainEmpty,

    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// Committed blocks and pending transactions
///
/// The chain and the pool have separate locks so a nonce search never blocks readers or
/// admission. `mining` serializes everything that appends a block.
#[derive(Debug, Default)]
struct Ledger {
    chain: RwLock<Vec<Block>>,
    transaction_pool: Mutex<Vec<Transaction>>,
    mining: Mutex<()>,
}

impl Ledger {
    /// Removes the first `pooled` pending transactions and appends `block`
    ///
    /// Callers hold `mining`, so the pool still starts with the transactions the block was
    /// built from. Anything admitted after the snapshot stays pending.
    fn commit(&self, block: Block, pooled: usize) -> usize {
        let mut transaction_pool = self.transaction_pool.lock();
        let pooled = pooled.min(transaction_pool.len());
        transaction_pool.drain(..pooled);

        let mut chain = self.chain.write();
        chain.push(block);
        chain.len()
    }

    fn last_block(&self) -> Result<Block, BlockchainError> {
        self.chain.read().last().cloned().ok_or(BlockchainError::ChainEmpty)
    }
}

/// Represents the blockchain
///
/// Cloning yields another handle to the same chain.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks and the transaction pool
    ledger: Arc<Ledger>,

    /// Address credited with mining rewards
    blockchain_address: String,

    /// Port the owning node serves on
    port: u16,

    /// Nonce search used when mining and validating
    proof_of_work: ProofOfWork,

    /// Mining reward
    mining_reward: f32,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block at the default difficulty
    pub fn new(blockchain_address: impl Into<String>, port: u16) -> Result<Self, BlockchainError> {
        Blockchain::with_proof_of_work(blockchain_address, port, ProofOfWork::default())
    }

    /// Creates a new blockchain with a genesis block at the given difficulty
    pub fn with_difficulty(
        blockchain_address: impl Into<String>,
        port: u16,
        difficulty: usize,
    ) -> Result<Self, BlockchainError> {
        Blockchain::with_proof_of_work(blockchain_address, port, ProofOfWork::new(difficulty)?)
    }

    fn with_proof_of_work(
        blockchain_address: impl Into<String>,
        port: u16,
        proof_of_work: ProofOfWork,
    ) -> Result<Self, BlockchainError> {
        let blockchain = Blockchain {
            ledger: Arc::new(Ledger::default()),
            blockchain_address: blockchain_address.into(),
            port,
            proof_of_work,
            mining_reward: MINING_REWARD,
        };
        blockchain.create_block(0, Block::zero().hash()?);

        Ok(blockchain)
    }

    pub fn blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn difficulty(&self) -> usize {
        self.proof_of_work.difficulty()
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<Block, BlockchainError> {
        self.ledger.last_block()
    }

    /// Gets the entire blockchain
    pub fn chain(&self) -> Vec<Block> {
        self.ledger.chain.read().clone()
    }

    /// Independent copies of every pending transaction, in admission order
    pub fn copy_transaction_pool(&self) -> Vec<Transaction> {
        self.ledger.transaction_pool.lock().clone()
    }

    /// Appends a block holding the current pool and empties the pool
    ///
    /// No proof of work is checked here; [`Blockchain::mine`] is the checked path.
    pub fn create_block(&self, nonce: u64, previous_hash: BlockHash) -> Block {
        let _mining = self.ledger.mining.lock();

        let transactions = self.copy_transaction_pool();
        let pooled = transactions.len();
        let block = Block::new(nonce, previous_hash, transactions);

        self.ledger.commit(block.clone(), pooled);
        block
    }

    /// Admits a transaction into the pool
    ///
    /// Transactions from [`super::transaction::MINING_SENDER`] are admitted without a
    /// signature. Any other sender needs a signature that verifies under `sender_public_key`.
    /// Values that are not finite are refused for every sender. On failure the pool is left
    /// untouched and the reason is returned. Sender balances are not checked.
    pub fn add_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: f32,
        sender_public_key: Option<&VerifyingKey>,
        signature: Option<&TransactionSignature>,
    ) -> Result<(), BlockchainError> {
        let transaction = Transaction::new(sender, recipient, value);

        let admitted = match transaction.check_value() {
            Ok(()) if transaction.is_reward() => Ok(()),
            Ok(()) => verify_transaction(&transaction, sender_public_key, signature),
            Err(err) => Err(err),
        };

        if let Err(err) = admitted {
            warn!("Rejected transaction from {} to {}: {}", sender, recipient, err);
            return Err(err.into());
        }

        self.ledger.transaction_pool.lock().push(transaction);
        Ok(())
    }

    /// Mines a new block from the pool plus a reward for the chain owner
    ///
    /// Only other miners wait on the search. The block holds the pool as it was when the
    /// search started; transactions admitted meanwhile stay pending for the next block.
    pub fn mine(&self) -> Result<Block, BlockchainError> {
        let _mining = self.ledger.mining.lock();

        let previous_hash = self.last_block()?.hash()?;

        let mut transactions = self.copy_transaction_pool();
        let pooled = transactions.len();
        transactions.push(Transaction::new_reward(
            self.blockchain_address.as_str(),
            self.mining_reward,
        ));

        let nonce = self.proof_of_work.solve(&previous_hash, &transactions)?;

        let block = Block::new(nonce, previous_hash, transactions);
        let height = self.ledger.commit(block.clone(), pooled) - 1;

        info!(
            "Mined block {} with nonce {} ({} transactions)",
            height,
            nonce,
            block.transactions.len()
        );

        Ok(block)
    }

    /// Balance of `address` over every mined block; pending transactions are not counted
    pub fn total_amount(&self, address: &str) -> f32 {
        let chain = self.ledger.chain.read();
        let mut total_amount = 0.0;

        for block in chain.iter() {
            for transaction in &block.transactions {
                if transaction.recipient == address {
                    total_amount += transaction.value;
                }

                if transaction.sender == address {
                    total_amount -= transaction.value;
                }
            }
        }

        total_amount
    }

    /// Checks the genesis block, hash links and proof of work of the whole chain
    pub fn validate(&self) -> Result<(), BlockchainError> {
        let chain = self.ledger.chain.read();

        let genesis = chain.first().ok_or(BlockchainError::ChainEmpty)?;
        if genesis.previous_hash != Block::zero().hash()? {
            return Err(BlockchainError::InvalidChain(
                "genesis block does not follow the zero block".to_string(),
            ));
        }

        for (index, pair) in chain.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let height = index + 1;

            if current.previous_hash != previous.hash()? {
                return Err(BlockchainError::InvalidChain(format!(
                    "block {} does not link to block {}",
                    height, index
                )));
            }

            if !self.proof_of_work.is_valid_proof(
                current.nonce,
                &current.previous_hash,
                &current.transactions,
            )? {
                return Err(BlockchainError::InvalidChain(format!(
                    "block {} fails proof of work at difficulty {}",
                    height,
                    self.difficulty()
                )));
            }
        }

        Ok(())
    }

    /// Validates the blockchain
    ///
    /// Structural problems give `Ok(false)`; failures to hash at all are returned as errors.
    pub fn is_valid(&self) -> Result<bool, BlockchainError> {
        match self.validate() {
            Ok(()) => Ok(true),
            Err(BlockchainError::InvalidChain(reason)) => {
                warn!("Chain validation failed: {}", reason);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

fn verify_transaction(
    transaction: &Transaction,
    sender_public_key: Option<&VerifyingKey>,
    signature: Option<&TransactionSignature>,
) -> Result<(), TransactionError> {
    let public_key = sender_public_key.ok_or(TransactionError::MissingPublicKey)?;
    let signature = signature.ok_or(TransactionError::MissingSignature)?;

    if transaction.verify_signature(public_key, signature)? {
        Ok(())
    } else {
        Err(TransactionError::InvalidSignature)
    }
}
