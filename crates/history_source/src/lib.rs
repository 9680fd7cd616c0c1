pub mod helius;
pub mod rpc;

pub use helius::{HeliusConfig, HeliusTradeSource};
pub use rpc::RpcMintInfoSource;
