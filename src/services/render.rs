use crate::chain_api::Service;
use crate::services::amount;
use serde::Serialize;
use std::fmt;

/// Identity attached to a rendered listing: position at render time plus the
/// lister-chosen id, so handlers can detect that the position has moved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceKey {
    pub index: u64,
    pub service_id: String,
}

impl From<&Service> for ServiceKey {
    fn from(service: &Service) -> Self {
        Self {
            index: service.index,
            service_id: service.service_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Purchase,
    Update,
    Remove,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Purchase, Action::Update, Action::Remove];

    /// Terminal verb that triggers this action
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Purchase => "hire",
            Action::Update => "update",
            Action::Remove => "remove",
        }
    }
}

/// Display form of one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCard {
    pub key: ServiceKey,
    pub name: String,
    pub description: String,
    pub price: String,
    pub clients: String,
    pub reputation: String,
    pub actions: Vec<Action>,
}

impl fmt::Display for ServiceCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.key.index, self.name)?;
        writeln!(f, "    {}", self.description)?;
        writeln!(f, "    Price: {}", self.price)?;
        writeln!(f, "    {} Clients have used this service", self.clients)?;
        writeln!(f, "    Reputation: {}", self.reputation)?;

        let actions: Vec<String> = self
            .actions
            .iter()
            .map(|a| format!("{} {}", a.verb(), self.key.index))
            .collect();
        write!(f, "    {}", actions.join(" | "))
    }
}

/// Where balances and listings are displayed
pub trait Surface: Send + Sync {
    fn show_balance(&self, balance: &str);

    /// Replace everything currently listed with `cards`
    fn show_services(&self, cards: &[ServiceCard]);
}

/// Build the full card list for a cache snapshot
pub fn render(services: &[Service]) -> Vec<ServiceCard> {
    services.iter().map(render_card).collect()
}

fn render_card(service: &Service) -> ServiceCard {
    ServiceCard {
        key: ServiceKey::from(service),
        name: service.service_name.clone(),
        description: service.service_description.clone(),
        price: amount::to_display(service.service_price),
        clients: service.total_number_of_clients.to_string(),
        reputation: service.service_reputation.to_string(),
        actions: Action::ALL.to_vec(),
    }
}
