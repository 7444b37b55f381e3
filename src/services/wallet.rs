use crate::chain_api::{ChainMarketplace, ChainToken, MarketplaceContract, TokenContract};
use crate::error::{MarketError, Result};
use crate::services::config::BlockchainSettings;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::sync::Arc;

/// An authorized connection: the active account plus its two contract handles
#[derive(Clone)]
pub struct Session {
    account: Address,
    marketplace_address: Address,
    marketplace: Arc<dyn MarketplaceContract>,
    token: Arc<dyn TokenContract>,
}

impl Session {
    pub fn new(
        account: Address,
        marketplace_address: Address,
        marketplace: Arc<dyn MarketplaceContract>,
        token: Arc<dyn TokenContract>,
    ) -> Self {
        Self {
            account,
            marketplace_address,
            marketplace,
            token,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Spender that token approvals are granted to
    pub fn marketplace_address(&self) -> Address {
        self.marketplace_address
    }

    pub fn marketplace(&self) -> &dyn MarketplaceContract {
        self.marketplace.as_ref()
    }

    pub fn token(&self) -> &dyn TokenContract {
        self.token.as_ref()
    }
}

pub struct WalletService;

impl WalletService {
    /// Connect and log any failure. `None` leaves the app unconnected.
    pub async fn connect(settings: &BlockchainSettings) -> Option<Session> {
        match Self::try_connect(settings).await {
            Ok(session) => Some(session),
            Err(MarketError::ConnectionFailed(reason)) => {
                log::error!("Could not reach the {} network: {}", settings.network, reason);
                None
            }
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    pub async fn try_connect(settings: &BlockchainSettings) -> Result<Session> {
        let rpc_url = settings.rpc_url.trim();
        if rpc_url.is_empty() {
            return Err(MarketError::ConnectionFailed(
                "no RPC endpoint configured; set blockchain.rpc_url".to_string(),
            ));
        }

        let marketplace_address =
            parse_address("marketplace_address", &settings.marketplace_address)?;
        let token_address = parse_address("token_address", &settings.token_address)?;

        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| {
            MarketError::ConnectionFailed(format!("invalid RPC URL {}: {}", rpc_url, e))
        })?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| MarketError::ConnectionFailed(format!("{}: {}", rpc_url, e)))?;

        let wallet =
            load_wallet(settings.private_key.as_deref())?.with_chain_id(chain_id.as_u64());
        let account = wallet.address();

        log::info!(
            "Connected to {} (chain {}) as {:?}",
            settings.network,
            chain_id,
            account
        );

        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Session::new(
            account,
            marketplace_address,
            Arc::new(ChainMarketplace::new(marketplace_address, client.clone())),
            Arc::new(ChainToken::new(token_address, client)),
        ))
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| {
            MarketError::ConfigError(format!("blockchain.{} {:?}: {}", field, value, e))
        })
}

/// A missing or unreadable key is the terminal's equivalent of the user
/// declining the wallet prompt.
fn load_wallet(private_key: Option<&str>) -> Result<LocalWallet> {
    let key = private_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            MarketError::AuthorizationDeclined(
                "no signing key configured; set SKILL_MARKET__BLOCKCHAIN__PRIVATE_KEY".to_string(),
            )
        })?;

    key.trim_start_matches("0x")
        .parse::<LocalWallet>()
        .map_err(|e| MarketError::AuthorizationDeclined(format!("invalid signing key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_declined() {
        assert!(matches!(
            load_wallet(None),
            Err(MarketError::AuthorizationDeclined(_))
        ));
        assert!(matches!(
            load_wallet(Some("   ")),
            Err(MarketError::AuthorizationDeclined(_))
        ));
    }

    #[test]
    fn test_garbage_key_is_declined() {
        assert!(matches!(
            load_wallet(Some("not-a-key")),
            Err(MarketError::AuthorizationDeclined(_))
        ));
    }

    #[test]
    fn test_key_with_or_without_prefix() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let plain = load_wallet(Some(key)).unwrap();
        let prefixed = load_wallet(Some(format!("0x{}", key).as_str())).unwrap();

        assert_eq!(plain.address(), prefixed.address());
        assert_eq!(
            plain.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_default_addresses_parse() {
        let settings = BlockchainSettings::default();
        assert!(parse_address("marketplace_address", &settings.marketplace_address).is_ok());
        assert!(parse_address("token_address", &settings.token_address).is_ok());
        assert!(matches!(
            parse_address("token_address", "0x1234"),
            Err(MarketError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_rpc_url_fails_without_network() {
        let settings = BlockchainSettings {
            rpc_url: "  ".to_string(),
            ..BlockchainSettings::default()
        };

        assert!(matches!(
            WalletService::try_connect(&settings).await,
            Err(MarketError::ConnectionFailed(_))
        ));
        assert!(WalletService::connect(&settings).await.is_none());
    }
}
