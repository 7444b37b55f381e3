// Service layer - view-model, wallet connection and supporting pieces

pub mod amount;
pub mod config;
pub mod marketplace;
pub mod render;
pub mod wallet;

pub use config::ConfigService;
pub use marketplace::MarketplaceService;
pub use wallet::{Session, WalletService};
