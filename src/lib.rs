pub mod chain_api;
pub mod commands;
pub mod error;
pub mod services;
pub mod state;
pub mod terminal;

use commands::{Command, Flow};
use services::ConfigService;
use state::AppState;
use terminal::Prompter;

pub fn run() -> anyhow::Result<()> {
    let config_service = ConfigService::new();
    let app_config = config_service.get();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(app_config.log_level.as_str()),
    )
    .init();

    log::info!("Skill Market v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Configuration: {:?}", config_service.path());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(event_loop(config_service))
}

async fn event_loop(config_service: ConfigService) -> anyhow::Result<()> {
    log::info!("Loading the Skill Market Place");
    let state = AppState::connect(config_service).await;

    // Startup sequence: balance first, then the service list
    if let Ok(market) = state.market() {
        if let Err(e) = market.get_balance().await {
            log::error!("Failed to read balance: {}", e);
        }
        if let Err(e) = market.get_services().await {
            log::error!("Failed to load services: {}", e);
        }
    }

    println!("Type `help` for a list of commands.");
    let mut prompter = Prompter::new(tokio::io::stdin());

    while let Some(line) = prompter.ask("> ").await? {
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };

        match commands::dispatch(&state, command, &mut prompter).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => log::error!("{}", e),
        }
    }

    log::info!("Skill Market shutting down");
    Ok(())
}
