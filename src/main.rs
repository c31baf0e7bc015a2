use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use kyoku_blockchain::config::Config;
use kyoku_blockchain::{api, blockchain};

// Build the node's chain, owned by a freshly generated miner wallet
fn initialize_blockchain(config: &Config) -> anyhow::Result<blockchain::Blockchain> {
    let miner_wallet = blockchain::Wallet::generate();
    info!("Miner wallet address: {}", miner_wallet.address());
    info!("Miner wallet public key: {}", miner_wallet.public_key_str());

    let blockchain = blockchain::Blockchain::with_difficulty(
        miner_wallet.address().as_str(),
        config.port,
        config.difficulty,
    )?;
    info!(
        "Created blockchain for {} at difficulty {}",
        blockchain.blockchain_address(),
        blockchain.difficulty()
    );

    Ok(blockchain)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::get_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::get_amount,
        api::handlers::validate_chain,
        api::handlers::create_wallet,
        api::handlers::wallet_transaction
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            api::schema::ChainResponse,
            api::schema::PoolResponse,
            api::schema::TransactionRequest,
            api::schema::WalletTransactionRequest,
            api::schema::TransactionResponse,
            api::schema::MineResponse,
            api::schema::AmountResponse,
            api::schema::WalletResponse,
            api::schema::ErrorResponse
        )
    ),
    tags(
        (name = "blockchain", description = "Ledger node API endpoints")
    ),
    info(
        title = "Blockchain API",
        version = "1.0.0",
        description = "Single-node proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // One chain for the lifetime of the server, shared with every handler
    let blockchain = web::Data::new(initialize_blockchain(&config)?);

    let port = blockchain.port();
    info!("Starting HTTP server at http://{}:{}", config.host, port);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
