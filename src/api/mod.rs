// API module
//
// HTTP surface of the ledger node: chain and pool queries, transaction
// submission, mining and wallet helpers

pub mod handlers;
pub mod routes;
pub mod schema;

// Re-export main components for easier access
pub use routes::configure_routes;
