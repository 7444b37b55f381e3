// Terminal command handlers

pub mod services;
pub mod system;

pub use services::*;
pub use system::*;

use crate::error::{MarketError, Result};
use crate::services::amount;
use crate::services::render::ServiceCard;
use crate::state::AppState;
use crate::terminal::Prompter;
use std::future::Future;
use std::str::FromStr;
use tokio::io::AsyncRead;

pub const HELP: &str = "\
Commands:
  list            show the services from the last sync
  refresh         re-read every service from the marketplace
  balance         show your token balance
  status          show account and sync state
  add             list a new service
  hire <n>        approve payment for service #n and purchase it
  update <n>      change the price and description of service #n
  remove <n>      delete service #n
  config          print the effective configuration
  config init     write the configuration file (environment overrides are not saved)
  version         print the version
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Refresh,
    Balance,
    Status,
    Add,
    Hire(u64),
    Update(u64),
    Remove(u64),
    Config,
    InitConfig,
    Version,
    Quit,
}

impl FromStr for Command {
    type Err = MarketError;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let index = |arg: Option<&str>| -> Result<u64> {
            let raw = arg.ok_or_else(|| {
                MarketError::InvalidInput(format!("`{}` needs a service number", verb))
            })?;
            raw.parse::<u64>()
                .map_err(|_| MarketError::InvalidInput(format!("not a service number: {}", raw)))
        };

        let command = match verb.as_str() {
            "help" | "?" => Command::Help,
            "list" | "ls" => Command::List,
            "refresh" | "sync" => Command::Refresh,
            "balance" => Command::Balance,
            "status" => Command::Status,
            "add" => Command::Add,
            "hire" | "buy" | "purchase" => Command::Hire(index(arg)?),
            "update" => Command::Update(index(arg)?),
            "remove" | "rm" => Command::Remove(index(arg)?),
            "config" => match arg {
                None => Command::Config,
                Some("init") => Command::InitConfig,
                Some(other) => {
                    return Err(MarketError::InvalidInput(format!(
                        "unknown config action: {}",
                        other
                    )))
                }
            },
            "version" => Command::Version,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(MarketError::InvalidInput(format!(
                    "unknown command `{}`; type `help`",
                    other
                )))
            }
        };

        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command. Prompts are answered before anything is sent to the
/// chain; contract calls then run in the background so the prompt stays free.
pub async fn dispatch<R: AsyncRead + Unpin>(
    state: &AppState,
    command: Command,
    prompter: &mut Prompter<R>,
) -> Result<Flow> {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(Flow::Quit),
        Command::Version => println!("skill-market {}", get_app_version()),
        Command::Config => {
            let config = get_config(state).await;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::InitConfig => init_config(state).await?,
        Command::List => list_services(state).await?,
        Command::Status => {
            let market_state = get_market_state(state).await?;
            println!("{}", serde_json::to_string_pretty(&market_state)?);
        }
        Command::Balance => spawn_handler("balance", state, move |state| async move {
            get_balance(&state).await.map(|_| ())
        }),
        Command::Refresh => spawn_handler("refresh", state, move |state| async move {
            let synced = refresh_services(&state).await?;
            log::info!("Loaded {} services", synced);
            Ok(())
        }),
        Command::Add => {
            state.market()?;
            let Some(form) = prompter.service_form().await? else {
                return Ok(Flow::Continue);
            };
            spawn_handler("add", state, move |state| async move {
                add_service(&state, form).await
            });
        }
        Command::Hire(index) => {
            state.market()?;
            let card = on_screen(state, index)?;
            log::info!("Hiring \"{}\" for {}", card.name, card.price);
            spawn_handler("purchase", state, move |state| async move {
                purchase_service(&state, card.key).await
            });
        }
        Command::Update(index) => {
            state.market()?;
            let key = on_screen(state, index)?.key;
            let form = prompter.update_form().await?;
            if let Some(price) = form.new_price.as_deref().filter(|p| !p.trim().is_empty()) {
                amount::to_smallest_unit(price)?;
            }
            spawn_handler("update", state, move |state| async move {
                update_service(&state, key, form).await.map(|_| ())
            });
        }
        Command::Remove(index) => {
            state.market()?;
            let card = on_screen(state, index)?;
            let confirm = get_config(state).await.display.confirm_removals;
            if confirm {
                let question = format!(
                    "Are you sure you want to remove the service \"{}\"?",
                    card.name
                );
                if !prompter.confirm(&question).await? {
                    return Ok(Flow::Continue);
                }
            }
            spawn_handler("remove", state, move |state| async move {
                remove_service(&state, card.key).await
            });
        }
    }

    Ok(Flow::Continue)
}

fn on_screen(state: &AppState, index: u64) -> Result<ServiceCard> {
    state.terminal.displayed_card(index).ok_or_else(|| {
        MarketError::ServiceNotFound(format!("no service #{} on screen; try `list`", index))
    })
}

fn spawn_handler<F, Fut>(label: &'static str, state: &AppState, handler: F)
where
    F: FnOnce(AppState) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = handler(state).await {
            log::error!("{} failed: {}", label, e);
        }
    });
}
