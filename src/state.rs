use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{MarketError, Result};
use crate::services::{ConfigService, MarketplaceService, WalletService};
use crate::terminal::TerminalSurface;

/// Application context handed to every command handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<ConfigService>>,
    pub terminal: Arc<TerminalSurface>,
    /// `None` when the wallet connection failed at startup
    pub market: Option<Arc<MarketplaceService>>,
}

impl AppState {
    pub fn new(
        config_service: ConfigService,
        terminal: Arc<TerminalSurface>,
        market: Option<Arc<MarketplaceService>>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config_service)),
            terminal,
            market,
        }
    }

    /// Build the state and attempt the wallet connection
    pub async fn connect(config_service: ConfigService) -> Self {
        let app_config = config_service.get();

        log::info!(
            "Initializing marketplace: network={}, marketplace={}, token={} ({})",
            app_config.blockchain.network,
            app_config.blockchain.marketplace_address,
            app_config.blockchain.token_address,
            app_config.blockchain.token_symbol
        );

        let terminal = Arc::new(TerminalSurface::new(
            &app_config.display,
            &app_config.blockchain.token_symbol,
        ));

        let market = WalletService::connect(&app_config.blockchain)
            .await
            .map(|session| Arc::new(MarketplaceService::new(session, terminal.clone())));

        if market.is_none() {
            log::warn!("Running without a wallet; marketplace commands are unavailable");
        }

        Self::new(config_service, terminal, market)
    }

    pub fn market(&self) -> Result<Arc<MarketplaceService>> {
        self.market.clone().ok_or(MarketError::NotConnected)
    }
}
