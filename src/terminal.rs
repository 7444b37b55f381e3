//! Terminal front end: the display surface and line prompts

use crate::error::Result;
use crate::services::config::{DisplayFormat, DisplaySettings};
use crate::services::marketplace::{ServiceForm, UpdateForm};
use crate::services::render::{ServiceCard, ServiceKey, Surface};
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Prints listings to stdout and remembers what it last showed, so that
/// `hire 2` refers to the card the user actually saw as #2.
pub struct TerminalSurface {
    format: DisplayFormat,
    symbol: String,
    displayed: Mutex<Vec<ServiceCard>>,
}

impl TerminalSurface {
    pub fn new(display: &DisplaySettings, symbol: &str) -> Self {
        Self {
            format: display.format,
            symbol: symbol.to_string(),
            displayed: Mutex::new(Vec::new()),
        }
    }

    /// Card shown under `index` in the last render
    pub fn displayed_card(&self, index: u64) -> Option<ServiceCard> {
        self.displayed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|card| card.key.index == index)
            .cloned()
    }

    pub fn displayed_key(&self, index: u64) -> Option<ServiceKey> {
        self.displayed_card(index).map(|card| card.key)
    }

    fn print_json(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Failed to encode output: {}", e),
        }
    }
}

impl Surface for TerminalSurface {
    fn show_balance(&self, balance: &str) {
        match self.format {
            DisplayFormat::Text => println!("Balance: {} {}", balance, self.symbol),
            DisplayFormat::Json => self.print_json(&json!({
                "balance": balance,
                "symbol": self.symbol,
            })),
        }
    }

    fn show_services(&self, cards: &[ServiceCard]) {
        *self.displayed.lock().unwrap_or_else(|e| e.into_inner()) = cards.to_vec();

        match self.format {
            DisplayFormat::Text => {
                if cards.is_empty() {
                    println!("No services listed yet. Use `add` to list one.");
                    return;
                }
                println!("{} services (prices in {})", cards.len(), self.symbol);
                for card in cards {
                    println!("{}\n", card);
                }
            }
            DisplayFormat::Json => self.print_json(&json!(cards)),
        }
    }
}

/// Reads answers line by line from any async reader (stdin in the app)
pub struct Prompter<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> Prompter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Print `question` and wait for a line. `None` at end of input.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{}", question);
        std::io::stdout().flush()?;

        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N] ", question)).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    /// Collect the fields of a new listing. `None` if input ended early.
    pub async fn service_form(&mut self) -> Result<Option<ServiceForm>> {
        let Some(service_id) = self.ask("Service id: ").await? else {
            return Ok(None);
        };
        let Some(service_name) = self.ask("Service name: ").await? else {
            return Ok(None);
        };
        let Some(service_description) = self.ask("Description: ").await? else {
            return Ok(None);
        };
        let Some(service_price) = self.ask("Price: ").await? else {
            return Ok(None);
        };

        Ok(Some(ServiceForm {
            service_id,
            service_name,
            service_description,
            service_price,
        }))
    }

    pub async fn update_form(&mut self) -> Result<UpdateForm> {
        let new_price = self.ask("Enter new Price: ").await?;
        let new_description = self
            .ask("Enter new Description: ")
            .await?
            .unwrap_or_default();

        Ok(UpdateForm {
            new_price,
            new_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::render::Action;

    fn card(index: u64, id: &str) -> ServiceCard {
        ServiceCard {
            key: ServiceKey {
                index,
                service_id: id.to_string(),
            },
            name: format!("Service {}", id),
            description: String::new(),
            price: "1.00".to_string(),
            clients: "0".to_string(),
            reputation: "0".to_string(),
            actions: Action::ALL.to_vec(),
        }
    }

    #[test]
    fn test_surface_remembers_last_render_only() {
        let surface = TerminalSurface::new(&DisplaySettings::default(), "cUSD");

        surface.show_services(&[card(0, "a"), card(1, "b")]);
        assert_eq!(surface.displayed_key(1).unwrap().service_id, "b");

        surface.show_services(&[card(0, "b")]);
        assert_eq!(surface.displayed_key(0).unwrap().service_id, "b");
        assert!(surface.displayed_key(1).is_none());
    }

    #[tokio::test]
    async fn test_service_form_reads_four_answers() {
        let input: &[u8] = b"svc-1\n Logo design \nVector logos\n12.5\n";
        let mut prompter = Prompter::new(input);

        let form = prompter.service_form().await.unwrap().unwrap();

        assert_eq!(form.service_id, "svc-1");
        assert_eq!(form.service_name, "Logo design");
        assert_eq!(form.service_description, "Vector logos");
        assert_eq!(form.service_price, "12.5");
    }

    #[tokio::test]
    async fn test_service_form_cut_short() {
        let input: &[u8] = b"svc-1\nLogo\n";
        let mut prompter = Prompter::new(input);

        assert!(prompter.service_form().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_form_with_blank_price() {
        let input: &[u8] = b"\nnew words\n";
        let mut prompter = Prompter::new(input);

        let form = prompter.update_form().await.unwrap();

        assert_eq!(form.new_price.as_deref(), Some(""));
        assert_eq!(form.new_description, "new words");
    }

    #[tokio::test]
    async fn test_confirm_accepts_yes_only() {
        let input: &[u8] = b"Y\nno\n\n";
        let mut prompter = Prompter::new(input);

        assert!(prompter.confirm("Remove?").await.unwrap());
        assert!(!prompter.confirm("Remove?").await.unwrap());
        assert!(!prompter.confirm("Remove?").await.unwrap());
        assert!(!prompter.confirm("Remove?").await.unwrap());
    }
}
