use actix_web::{error, web, HttpResponse};

use super::handlers;
use super::schema::ErrorResponse;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api/v1")
            .route("/chain", web::get().to(handlers::get_chain))
            .route("/transactions", web::get().to(handlers::get_transactions))
            .route("/transactions", web::post().to(handlers::new_transaction))
            .route("/mine", web::post().to(handlers::mine_block))
            .route("/amount/{address}", web::get().to(handlers::get_amount))
            .route("/validate", web::get().to(handlers::validate_chain))
            .route("/wallet", web::post().to(handlers::create_wallet))
            .route("/wallet/transaction", web::post().to(handlers::wallet_transaction)),
    );
}

/// Malformed JSON bodies are answered with a 400 and a JSON error
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}
