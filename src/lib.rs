//! Single-node proof-of-work ledger
//!
//! - [`blockchain`] - blocks, transactions, proof of work, wallets and the chain itself
//! - [`api`] - actix-web handlers and routes serving the ledger over HTTP
//! - [`config`] - command line options for the node

pub mod api;
pub mod blockchain;
pub mod config;
