use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use p256::ecdsa::VerifyingKey;

use std::str::FromStr;

use super::schema::{
    AmountResponse, ChainResponse, ErrorResponse, MineResponse, PoolResponse, TransactionRequest,
    TransactionResponse, WalletResponse, WalletTransactionRequest,
};
use crate::blockchain::crypto::public_key_from_hex;
use crate::blockchain::{
    Blockchain, BlockchainError, TransactionError, TransactionSignature, Wallet, MINING_SENDER,
};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Get the full blockchain
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(ChainResponse {
        chains: blockchain.chain(),
    })
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    responses(
        (status = 200, description = "Pending transactions retrieved", body = PoolResponse)
    )
)]
pub async fn get_transactions(blockchain: BlockchainData) -> impl Responder {
    let transactions = blockchain.copy_transaction_pool();

    HttpResponse::Ok().json(PoolResponse {
        length: transactions.len(),
        transactions,
    })
}

/// Submit a signed transaction
///
/// The signature is verified against the sender's public key before the
/// transaction enters the pool
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction added to the pool", body = TransactionResponse),
        (status = 400, description = "Malformed or unverifiable transaction", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn new_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    if transaction_req.sender == MINING_SENDER {
        warn!("Refused client transaction from the reserved mining sender");
        return HttpResponse::BadRequest().json(ErrorResponse::new(format!(
            "Sender '{}' is reserved for mining rewards",
            MINING_SENDER
        )));
    }

    let public_key = match public_key_from_hex(&transaction_req.sender_public_key) {
        Ok(public_key) => public_key,
        Err(err) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new(format!("Invalid sender public key: {}", err)));
        }
    };

    let signature = match TransactionSignature::from_str(&transaction_req.signature) {
        Ok(signature) => signature,
        Err(err) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new(format!("Invalid signature: {}", err)));
        }
    };

    submit_transaction(
        &blockchain,
        &transaction_req.sender,
        &transaction_req.recipient,
        transaction_req.value,
        &public_key,
        &signature,
    )
}

/// Mine a new block
///
/// Creates a new block with all pending transactions and a reward for the node
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn mine_block(blockchain: BlockchainData) -> impl Responder {
    let chain = blockchain.get_ref().clone();

    // The nonce search is CPU bound, keep it off the async workers
    match web::block(move || chain.mine()).await {
        Ok(Ok(block)) => HttpResponse::Ok().json(MineResponse {
            message: "New Block Mined".to_string(),
            block,
        }),
        Ok(Err(err)) => {
            error!("Mining failed: {}", err);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to mine block: {}", err)))
        }
        Err(err) => {
            error!("Mining task failed: {}", err);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to mine block: {}", err)))
        }
    }
}

/// Get the balance of an address
///
/// Sums every mined transaction to and from the address
#[utoipa::path(
    get,
    path = "/api/v1/amount/{address}",
    params(
        ("address" = String, Path, description = "Blockchain address")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = AmountResponse)
    )
)]
pub async fn get_amount(blockchain: BlockchainData, address: web::Path<String>) -> impl Responder {
    let address = address.into_inner();
    let amount = blockchain.total_amount(&address);

    HttpResponse::Ok().json(AmountResponse { address, amount })
}

/// Check if the blockchain is valid
///
/// Validates hash links and proof of work of every block
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    match blockchain.is_valid() {
        Ok(is_valid) => HttpResponse::Ok().json(is_valid),
        Err(err) => {
            error!("Chain validation failed: {}", err);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to validate chain: {}", err)))
        }
    }
}

/// Create a new wallet
///
/// Creates a new wallet with a random P-256 keypair
///
/// The private key must be stored by your own
#[utoipa::path(
    post,
    path = "/api/v1/wallet",
    responses(
        (status = 201, description = "Wallet created successfully", body = WalletResponse)
    )
)]
pub async fn create_wallet() -> impl Responder {
    let wallet = Wallet::generate();
    info!("Created wallet {}", wallet.address());

    HttpResponse::Created().json(WalletResponse {
        private_key: wallet.private_key_str(),
        public_key: wallet.public_key_str(),
        blockchain_address: wallet.address().0.clone(),
    })
}

/// Sign and submit a transaction
///
/// Signs the transaction with the supplied private key and adds it to the pool
#[utoipa::path(
    post,
    path = "/api/v1/wallet/transaction",
    request_body = WalletTransactionRequest,
    responses(
        (status = 201, description = "Transaction added to the pool", body = TransactionResponse),
        (status = 400, description = "Invalid key or transaction data", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn wallet_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<WalletTransactionRequest>,
) -> impl Responder {
    let wallet = match Wallet::from_private_key_hex(&transaction_req.sender_private_key) {
        Ok(wallet) => wallet,
        Err(err) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new(format!("Invalid private key: {}", err)));
        }
    };

    if wallet.address().0 != transaction_req.sender_blockchain_address {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Private key does not match sender address",
        ));
    }

    let (transaction, signature) = match wallet
        .sign_transaction(&transaction_req.recipient_blockchain_address, transaction_req.value)
    {
        Ok(signed) => signed,
        Err(err @ TransactionError::InvalidValue(_)) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new(format!("Failed to add transaction: {}", err)));
        }
        Err(err) => {
            error!("Failed to sign transaction: {}", err);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to sign transaction: {}", err)));
        }
    };

    submit_transaction(
        &blockchain,
        &transaction.sender,
        &transaction.recipient,
        transaction.value,
        wallet.public_key(),
        &signature,
    )
}

fn submit_transaction(
    blockchain: &Blockchain,
    sender: &str,
    recipient: &str,
    value: f32,
    public_key: &VerifyingKey,
    signature: &TransactionSignature,
) -> HttpResponse {
    match blockchain.add_transaction(sender, recipient, value, Some(public_key), Some(signature)) {
        Ok(()) => HttpResponse::Created().json(TransactionResponse {
            message: "success".to_string(),
        }),
        Err(BlockchainError::TransactionError(TransactionError::SerializationError(err)))
        | Err(BlockchainError::SerializationError(err)) => {
            error!("Failed to encode transaction: {}", err);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Failed to encode transaction: {}", err)))
        }
        Err(err) => HttpResponse::BadRequest()
            .json(ErrorResponse::new(format!("Failed to add transaction: {}", err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure_routes;

    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn test_blockchain() -> BlockchainData {
        web::Data::new(Blockchain::with_difficulty("owner", 5000, 1).unwrap())
    }

    fn signed_request(wallet: &Wallet, recipient: &str, value: f32) -> Value {
        let (transaction, signature) = wallet.sign_transaction(recipient, value).unwrap();

        json!({
            "sender": transaction.sender,
            "recipient": transaction.recipient,
            "value": transaction.value,
            "senderPublicKey": wallet.public_key_str(),
            "signature": signature.0,
        })
    }

    #[actix_web::test]
    async fn test_get_chain() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/chain").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let chains = body["chains"].as_array().unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0]["nonce"], 0);
        assert!(chains[0]["previous_hash"].is_string());
    }

    #[actix_web::test]
    async fn test_new_transaction() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;
        let wallet = Wallet::generate();

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(signed_request(&wallet, "recipient", 2.5))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/v1/transactions").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["transactions"][0]["recipient_blockchain_address"], "recipient");
        assert_eq!(body["transactions"][0]["value"], 2.5);
    }

    #[actix_web::test]
    async fn test_forged_transaction_rejected() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;
        let wallet = Wallet::generate();
        let forger = Wallet::generate();

        let mut body = signed_request(&wallet, "recipient", 2.5);
        body["senderPublicKey"] = json!(forger.public_key_str());

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let error: Value = test::read_body_json(resp).await;
        assert!(error["error"].as_str().unwrap().contains("Invalid signature"));
        assert!(blockchain.copy_transaction_pool().is_empty());
    }

    #[actix_web::test]
    async fn test_malformed_transaction_rejected() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(json!({ "sender": "A", "value": 1.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert!(error["error"].is_string());

        let mut body = signed_request(&Wallet::generate(), "recipient", 1.0);
        body["signature"] = json!("not-a-signature");
        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(blockchain.copy_transaction_pool().is_empty());
    }

    #[actix_web::test]
    async fn test_reserved_sender_rejected() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;

        let mut body = signed_request(&Wallet::generate(), "recipient", 1.0);
        body["sender"] = json!(MINING_SENDER);

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(blockchain.copy_transaction_pool().is_empty());
    }

    #[actix_web::test]
    async fn test_mine_and_amount() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/mine").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "New Block Mined");
        assert_eq!(body["block"]["transactions"][0]["send_blockchain_adress"], MINING_SENDER);
        assert_eq!(blockchain.chain().len(), 2);

        let req = test::TestRequest::get().uri("/api/v1/amount/owner").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["address"], "owner");
        assert_eq!(body["amount"], 1.0);

        let req = test::TestRequest::get().uri("/api/v1/validate").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!(true));
    }

    #[actix_web::test]
    async fn test_wallet_flow() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/wallet").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let wallet: Value = test::read_body_json(resp).await;
        assert_eq!(wallet["private_key"].as_str().unwrap().len(), 64);
        assert_eq!(wallet["public_key"].as_str().unwrap().len(), 128);

        let req = test::TestRequest::post()
            .uri("/api/v1/wallet/transaction")
            .set_json(json!({
                "sender_private_key": wallet["private_key"],
                "sender_blockchain_address": wallet["blockchain_address"],
                "recipient_blockchain_address": "recipient",
                "value": 4.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let pool = blockchain.copy_transaction_pool();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].sender, wallet["blockchain_address"].as_str().unwrap());
    }

    #[actix_web::test]
    async fn test_wallet_transaction_address_mismatch() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;
        let wallet = Wallet::generate();
        let other = Wallet::generate();

        let req = test::TestRequest::post()
            .uri("/api/v1/wallet/transaction")
            .set_json(json!({
                "sender_private_key": wallet.private_key_str(),
                "sender_blockchain_address": other.address().0,
                "recipient_blockchain_address": "recipient",
                "value": 4.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(blockchain.copy_transaction_pool().is_empty());
    }

    #[actix_web::test]
    async fn test_overflowing_value_rejected() {
        let blockchain = test_blockchain();
        let app = test::init_service(
            App::new().app_data(blockchain.clone()).configure(configure_routes),
        )
        .await;
        let wallet = Wallet::generate();

        // 1e39 does not fit in an f32 and would decode as infinity
        let mut body = signed_request(&wallet, "recipient", 1.0);
        body["value"] = json!(1e39);
        let req = test::TestRequest::post()
            .uri("/api/v1/transactions")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/wallet/transaction")
            .set_json(json!({
                "sender_private_key": wallet.private_key_str(),
                "sender_blockchain_address": wallet.address().0,
                "recipient_blockchain_address": "recipient",
                "value": 1e39,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert!(error["error"].as_str().unwrap().contains("Invalid value"));

        assert!(blockchain.copy_transaction_pool().is_empty());
    }
}
