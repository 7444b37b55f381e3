use crate::error::Result;
use crate::services::marketplace::{MarketState, ServiceForm, UpdateForm, UpdateOutcome};
use crate::services::render::ServiceKey;
use crate::state::AppState;
use ethers::types::U256;

pub async fn list_services(state: &AppState) -> Result<()> {
    let market = state.market()?;
    market.render().await;
    Ok(())
}

pub async fn refresh_services(state: &AppState) -> Result<usize> {
    let market = state.market()?;
    market.get_services().await
}

pub async fn get_balance(state: &AppState) -> Result<U256> {
    let market = state.market()?;
    market.get_balance().await
}

pub async fn get_market_state(state: &AppState) -> Result<MarketState> {
    let market = state.market()?;
    Ok(market.get_state().await)
}

pub async fn add_service(state: &AppState, form: ServiceForm) -> Result<()> {
    let market = state.market()?;
    market.add_service(form).await
}

pub async fn purchase_service(state: &AppState, key: ServiceKey) -> Result<()> {
    let market = state.market()?;
    market.purchase_service(&key).await
}

pub async fn update_service(
    state: &AppState,
    key: ServiceKey,
    form: UpdateForm,
) -> Result<UpdateOutcome> {
    let market = state.market()?;
    market.update_service(&key, form).await
}

pub async fn remove_service(state: &AppState, key: ServiceKey) -> Result<()> {
    let market = state.market()?;
    market.remove_service(&key).await
}
