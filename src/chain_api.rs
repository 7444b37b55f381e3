//! Typed access to the marketplace and stablecoin contracts
//!
//! The rest of the crate only talks to the two collaborator traits defined
//! here. The ethers-backed implementations bind the contract ABIs with
//! `abigen!` and submit state-changing calls through a signing middleware.

use crate::error::{MarketError, Result};
use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{abigen, ContractCall};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, TxHash, U256, U64};
use serde::Serialize;
use std::sync::Arc;

abigen!(
    SkillMarket,
    r#"[
        function viewNumberOfServicesAvailable() external view returns (uint256)
        function viewService(uint256 index) external view returns (address, string, string, string, uint256, uint256, uint256)
        function addService(string serviceId, string serviceName, string serviceDescription, uint256 servicePrice) external
        function updateService(uint256 index, uint256 newPrice, string newDescription) external
        function removeService(uint256 index) external
        function purchaseService(uint256 index) external
    ]"#
);

abigen!(
    StableToken,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

/// Middleware every contract handle is bound to
pub type ChainClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Raw tuple returned by `viewService(i)`
pub type ServiceRecord = (Address, String, String, String, U256, U256, U256);

/// Snapshot of one listing as read from the marketplace contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Position in the contract's service array; shifts when earlier entries are removed
    pub index: u64,
    pub provider: Address,
    pub service_id: String,
    pub service_name: String,
    pub service_description: String,
    /// Price in the token's smallest unit
    pub service_price: U256,
    pub service_reputation: U256,
    pub total_number_of_clients: U256,
}

impl Service {
    pub fn from_record(index: u64, record: ServiceRecord) -> Self {
        let (provider, service_id, service_name, service_description, price, reputation, clients) =
            record;

        Self {
            index,
            provider,
            service_id,
            service_name,
            service_description,
            service_price: price,
            service_reputation: reputation,
            total_number_of_clients: clients,
        }
    }
}

/// Arguments of `addService`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub service_id: String,
    pub service_name: String,
    pub service_description: String,
    pub service_price: U256,
}

/// Marketplace contract surface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceContract: Send + Sync {
    async fn service_count(&self) -> Result<u64>;
    async fn view_service(&self, index: u64) -> Result<Service>;
    async fn add_service(&self, listing: NewListing) -> Result<()>;
    async fn update_service(&self, index: u64, price: U256, description: String) -> Result<()>;
    async fn remove_service(&self, index: u64) -> Result<()>;
    async fn purchase_service(&self, index: u64) -> Result<()>;
}

/// Stablecoin (ERC-20) contract surface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenContract: Send + Sync {
    async fn approve(&self, spender: Address, amount: U256) -> Result<()>;
    async fn balance_of(&self, account: Address) -> Result<U256>;
}

/// Send a transaction and wait for its receipt
async fn submit<D: Detokenize>(call: ContractCall<ChainClient, D>, label: &str) -> Result<TxHash> {
    let pending = call
        .send()
        .await
        .map_err(|e| MarketError::ContractError(format!("{} rejected: {}", label, e)))?;

    let tx_hash = *pending;
    log::debug!("{} submitted as {:?}", label, tx_hash);

    let receipt = pending
        .await
        .map_err(|e| MarketError::ContractError(format!("{} failed: {}", label, e)))?
        .ok_or_else(|| {
            MarketError::ContractError(format!("{} dropped from mempool: {:?}", label, tx_hash))
        })?;

    if receipt.status == Some(U64::zero()) {
        return Err(MarketError::ContractError(format!(
            "{} reverted in {:?}",
            label, tx_hash
        )));
    }

    Ok(tx_hash)
}

/// Marketplace contract bound to a signing client
pub struct ChainMarketplace {
    contract: SkillMarket<ChainClient>,
}

impl ChainMarketplace {
    pub fn new(address: Address, client: Arc<ChainClient>) -> Self {
        Self {
            contract: SkillMarket::new(address, client),
        }
    }
}

#[async_trait]
impl MarketplaceContract for ChainMarketplace {
    async fn service_count(&self) -> Result<u64> {
        let count = self
            .contract
            .view_number_of_services_available()
            .call()
            .await
            .map_err(|e| {
                MarketError::ContractError(format!("viewNumberOfServicesAvailable failed: {}", e))
            })?;

        if count > U256::from(u64::MAX) {
            return Err(MarketError::ContractError(format!(
                "Service count out of range: {}",
                count
            )));
        }

        Ok(count.as_u64())
    }

    async fn view_service(&self, index: u64) -> Result<Service> {
        let record = self
            .contract
            .view_service(U256::from(index))
            .call()
            .await
            .map_err(|e| {
                MarketError::ContractError(format!("viewService({}) failed: {}", index, e))
            })?;

        Ok(Service::from_record(index, record))
    }

    async fn add_service(&self, listing: NewListing) -> Result<()> {
        let call = self.contract.add_service(
            listing.service_id,
            listing.service_name,
            listing.service_description,
            listing.service_price,
        );
        submit(call, "addService").await?;
        Ok(())
    }

    async fn update_service(&self, index: u64, price: U256, description: String) -> Result<()> {
        let call = self
            .contract
            .update_service(U256::from(index), price, description);
        submit(call, "updateService").await?;
        Ok(())
    }

    async fn remove_service(&self, index: u64) -> Result<()> {
        let call = self.contract.remove_service(U256::from(index));
        submit(call, "removeService").await?;
        Ok(())
    }

    async fn purchase_service(&self, index: u64) -> Result<()> {
        let call = self.contract.purchase_service(U256::from(index));
        submit(call, "purchaseService").await?;
        Ok(())
    }
}

/// Stablecoin contract bound to a signing client
pub struct ChainToken {
    contract: StableToken<ChainClient>,
}

impl ChainToken {
    pub fn new(address: Address, client: Arc<ChainClient>) -> Self {
        Self {
            contract: StableToken::new(address, client),
        }
    }
}

#[async_trait]
impl TokenContract for ChainToken {
    async fn approve(&self, spender: Address, amount: U256) -> Result<()> {
        let call = self.contract.approve(spender, amount);
        submit(call, "approve").await?;
        Ok(())
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        self.contract
            .balance_of(account)
            .call()
            .await
            .map_err(|e| MarketError::ContractError(format!("balanceOf failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_from_record_keeps_field_order() {
        let provider = Address::repeat_byte(0x11);
        let record: ServiceRecord = (
            provider,
            "svc-1".to_string(),
            "Logo design".to_string(),
            "Vector logos".to_string(),
            U256::from(5u64) * U256::exp10(18),
            U256::from(4u64),
            U256::from(12u64),
        );

        let service = Service::from_record(3, record);

        assert_eq!(service.index, 3);
        assert_eq!(service.provider, provider);
        assert_eq!(service.service_id, "svc-1");
        assert_eq!(service.service_name, "Logo design");
        assert_eq!(service.service_description, "Vector logos");
        assert_eq!(service.service_price, U256::from(5u64) * U256::exp10(18));
        assert_eq!(service.service_reputation, U256::from(4u64));
        assert_eq!(service.total_number_of_clients, U256::from(12u64));
    }

    #[test]
    fn test_service_serializes_camel_case() {
        let service = Service::from_record(
            0,
            (
                Address::zero(),
                "id".to_string(),
                "name".to_string(),
                "desc".to_string(),
                U256::zero(),
                U256::zero(),
                U256::zero(),
            ),
        );

        let json = serde_json::to_value(&service).unwrap();
        assert!(json.get("serviceId").is_some());
        assert!(json.get("totalNumberOfClients").is_some());
    }
}
