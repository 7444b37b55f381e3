use crate::error::Result;
use crate::services::config::AppConfig;
use crate::state::AppState;

pub async fn get_config(state: &AppState) -> AppConfig {
    let config = state.config.read().await;
    config.get()
}

/// Write the file-backed configuration (minus the signing key) to disk.
/// `SKILL_MARKET__*` overrides stay in the environment.
pub async fn init_config(state: &AppState) -> Result<()> {
    let config = state.config.read().await;
    config.save()
}

pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
