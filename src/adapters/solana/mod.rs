pub mod parsed;
pub mod rpc;
pub mod wallet;

pub use rpc::SolanaClient;
pub use wallet::KeypairWallet;
