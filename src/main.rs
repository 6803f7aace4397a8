//! Mintdeck - Solana wallet toolkit
//!
//! Token holdings with authorities and metadata, Token-2022 launches,
//! minting and authority revocation from the command line.

use mintdeck::adapters::cli;

#[tokio::main]
async fn main() {
    // Load .env file if it exists (RPC and keypair overrides go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    if let Err(e) = cli::execute(app).await {
        tracing::error!("{:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
