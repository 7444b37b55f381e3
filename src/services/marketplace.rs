//! Marketplace view-model
//!
//! Holds the local copy of the contract's service list and the four mutation
//! entry points. The cache is only ever replaced wholesale by a completed sync;
//! every mutation is followed by a full resync before the next mutation may
//! start, because service indices shift when a listing is removed. A mutation
//! that lands without a completed resync leaves the cache marked stale, and the
//! next mutation resyncs before it resolves its target.

use crate::chain_api::{NewListing, Service};
use crate::error::{MarketError, Result};
use crate::services::amount;
use crate::services::render::{self, ServiceKey, Surface};
use crate::services::wallet::Session;
use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Input for a new listing, as typed by the user
#[derive(Debug, Clone, Default)]
pub struct ServiceForm {
    pub service_id: String,
    pub service_name: String,
    pub service_description: String,
    pub service_price: String,
}

/// Input for changing a listing. A missing or blank price cancels the update.
#[derive(Debug, Clone, Default)]
pub struct UpdateForm {
    pub new_price: Option<String>,
    pub new_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Skipped,
}

/// Last complete snapshot of the contract's service list
#[derive(Debug, Clone, Default)]
pub struct ServiceCache {
    pub services: Vec<Service>,
    pub last_synced: Option<DateTime<Utc>>,
    /// A mutation landed on chain after the last completed sync
    pub stale: bool,
}

/// Marketplace state returned to the terminal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub account: Address,
    pub marketplace: Address,
    pub service_count: usize,
    pub last_synced: Option<DateTime<Utc>>,
    pub stale: bool,
}

pub struct MarketplaceService {
    session: Session,
    surface: Arc<dyn Surface>,
    cache: RwLock<ServiceCache>,
    /// Held from a mutation's first contract call until its resync completes
    mutations: Mutex<()>,
}

impl MarketplaceService {
    pub fn new(session: Session, surface: Arc<dyn Surface>) -> Self {
        Self {
            session,
            surface,
            cache: RwLock::new(ServiceCache::default()),
            mutations: Mutex::new(()),
        }
    }

    /// Current cache contents, ordered by index
    pub async fn services(&self) -> Vec<Service> {
        self.cache.read().await.services.clone()
    }

    pub async fn get_state(&self) -> MarketState {
        let cache = self.cache.read().await;

        MarketState {
            account: self.session.account(),
            marketplace: self.session.marketplace_address(),
            service_count: cache.services.len(),
            last_synced: cache.last_synced,
            stale: cache.stale,
        }
    }

    /// Read the account's token balance and show it
    pub async fn get_balance(&self) -> Result<U256> {
        let balance = self
            .session
            .token()
            .balance_of(self.session.account())
            .await?;

        self.surface.show_balance(&amount::to_display(balance));
        Ok(balance)
    }

    /// Re-read the whole service list and replace the cache.
    ///
    /// All index reads run concurrently. If any of them fails the cache is
    /// left exactly as it was.
    pub async fn get_services(&self) -> Result<usize> {
        let marketplace = self.session.marketplace();
        let count = marketplace.service_count().await?;

        let services = try_join_all((0..count).map(|i| marketplace.view_service(i))).await?;
        let synced = services.len();

        {
            let mut cache = self.cache.write().await;
            cache.services = services;
            cache.last_synced = Some(Utc::now());
            cache.stale = false;
        }

        log::debug!("Synced {} services", synced);
        self.render().await;
        Ok(synced)
    }

    /// Redraw every listing from the cache
    pub async fn render(&self) {
        let cards = {
            let cache = self.cache.read().await;
            render::render(&cache.services)
        };
        self.surface.show_services(&cards);
    }

    pub async fn add_service(&self, form: ServiceForm) -> Result<()> {
        let listing = NewListing {
            service_id: required("service id", &form.service_id)?,
            service_name: required("service name", &form.service_name)?,
            service_description: form.service_description.trim().to_string(),
            service_price: amount::to_smallest_unit(&form.service_price)?,
        };

        let _guard = self.mutations.lock().await;
        self.ensure_synced().await?;

        self.session.marketplace().add_service(listing).await?;
        self.mark_stale().await;
        log::info!("Successfully added a new service to the Market Place");

        self.get_services().await?;
        Ok(())
    }

    /// Approve the marketplace to take the price, then buy.
    ///
    /// If the approval fails the purchase is never sent. If the purchase fails
    /// after the approval went through, the allowance stays granted.
    pub async fn purchase_service(&self, key: &ServiceKey) -> Result<()> {
        let _guard = self.mutations.lock().await;
        self.ensure_synced().await?;
        let service = self.resolve(key).await?;

        self.session
            .token()
            .approve(self.session.marketplace_address(), service.service_price)
            .await
            .map_err(|e| MarketError::ApprovalFailed(e.to_string()))?;
        log::info!("Awaiting payment for this service");

        if let Err(e) = self
            .session
            .marketplace()
            .purchase_service(service.index)
            .await
        {
            log::warn!(
                "Allowance of {} granted to {:?} but \"{}\" was not purchased",
                amount::to_display(service.service_price),
                self.session.marketplace_address(),
                service.service_name
            );
            return Err(MarketError::PurchaseFailed(e.to_string()));
        }
        self.mark_stale().await;
        log::info!("Purchased \"{}\"", service.service_name);

        self.get_services().await?;
        self.get_balance().await?;
        Ok(())
    }

    pub async fn update_service(&self, key: &ServiceKey, form: UpdateForm) -> Result<UpdateOutcome> {
        let new_price = match form.new_price.as_deref().map(str::trim) {
            Some(price) if !price.is_empty() => amount::to_smallest_unit(price)?,
            _ => {
                log::info!("Update cancelled: no new price given");
                return Ok(UpdateOutcome::Skipped);
            }
        };

        let _guard = self.mutations.lock().await;
        self.ensure_synced().await?;
        let service = self.resolve(key).await?;

        self.session
            .marketplace()
            .update_service(service.index, new_price, form.new_description)
            .await?;
        self.mark_stale().await;
        log::info!("Updated \"{}\"", service.service_name);

        self.get_services().await?;
        Ok(UpdateOutcome::Updated)
    }

    pub async fn remove_service(&self, key: &ServiceKey) -> Result<()> {
        let _guard = self.mutations.lock().await;
        self.ensure_synced().await?;
        let service = self.resolve(key).await?;

        self.session
            .marketplace()
            .remove_service(service.index)
            .await?;
        self.mark_stale().await;
        log::info!("Removed \"{}\"", service.service_name);

        self.get_services().await?;
        Ok(())
    }

    /// Find the cached service a rendered key refers to now
    pub async fn resolve(&self, key: &ServiceKey) -> Result<Service> {
        let cache = self.cache.read().await;
        resolve_key(&cache.services, key)
    }

    /// Resync first if an earlier mutation landed without a completed resync.
    /// Callers hold the mutation gate.
    async fn ensure_synced(&self) -> Result<()> {
        if self.cache.read().await.stale {
            log::warn!("Service list is behind the chain; resyncing before the next change");
            self.get_services().await?;
        }
        Ok(())
    }

    async fn mark_stale(&self) {
        self.cache.write().await.stale = true;
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MarketError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Positional match first; otherwise the one service carrying the same id.
fn resolve_key(services: &[Service], key: &ServiceKey) -> Result<Service> {
    if let Some(service) = services.get(key.index as usize) {
        if service.service_id == key.service_id {
            return Ok(service.clone());
        }
    }

    let mut matches = services.iter().filter(|s| s.service_id == key.service_id);
    match (matches.next(), matches.next()) {
        (Some(service), None) => {
            log::warn!(
                "Service \"{}\" moved from index {} to {}",
                key.service_id,
                key.index,
                service.index
            );
            Ok(service.clone())
        }
        (Some(_), Some(_)) => Err(MarketError::StaleTarget(format!(
            "index {} no longer holds \"{}\" and the id is not unique",
            key.index, key.service_id
        ))),
        (None, _) => Err(MarketError::ServiceNotFound(key.service_id.clone())),
    }
}

#[cfg(test)]
impl MarketplaceService {
    /// Test-only constructor with a pre-filled cache
    pub fn with_services(session: Session, surface: Arc<dyn Surface>, services: Vec<Service>) -> Self {
        let service = Self::new(session, surface);
        service.cache.try_write().expect("fresh lock").services = services;
        service
    }
}
