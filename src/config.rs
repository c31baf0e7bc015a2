use clap::Parser;

use crate::blockchain::MINING_DIFFICULTY;

/// Command line configuration of the ledger node
#[derive(Debug, Parser)]
#[command(version, about, long_about = "Single-node proof-of-work ledger")]
pub struct Config {
    /// Interface the HTTP server binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port for the blockchain server.
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Number of leading zero hex characters a mined block hash needs.
    #[arg(short, long, default_value_t = MINING_DIFFICULTY)]
    pub difficulty: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["kyoku_blockchain"]);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.difficulty, MINING_DIFFICULTY);
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from(["kyoku_blockchain", "--port", "5001", "-d", "2"]);

        assert_eq!(config.port, 5001);
        assert_eq!(config.difficulty, 2);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Config::try_parse_from(["kyoku_blockchain", "--port", "70000"]).is_err());
    }
}
