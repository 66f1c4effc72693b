//! # Plan Catalog
//!
//! Purchasable plans and their payment processor price identifiers.
//! Plans are loaded from `config/products.toml`.

use crate::checkout::CheckoutMode;
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
        }
    }

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for USD)
    pub amount: i64,
    #[serde(default)]
    pub currency: Currency,
}

impl Price {
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Format for display (e.g., "$30.00")
    pub fn display(&self) -> String {
        match self.currency.decimal_places() {
            0 => format!("{}{}", self.currency.symbol(), self.amount),
            _ => format!(
                "{}{}.{:02}",
                self.currency.symbol(),
                self.amount / 100,
                self.amount % 100
            ),
        }
    }
}

/// Recurring billing interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

/// A purchasable plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Payment processor product id (prod_...)
    pub id: String,

    /// Payment processor price id (price_...)
    pub price_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub mode: CheckoutMode,

    pub price: Price,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<BillingInterval>,

    /// Whether this plan is offered for purchase
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Plan {
    /// Create a monthly subscription plan
    pub fn monthly(
        id: impl Into<String>,
        price_id: impl Into<String>,
        name: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            price_id: price_id.into(),
            name: name.into(),
            description: String::new(),
            mode: CheckoutMode::Subscription,
            price,
            interval: Some(BillingInterval::Month),
            active: true,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn is_subscription(&self) -> bool {
        self.mode == CheckoutMode::Subscription
    }
}

/// Plan catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCatalog {
    #[serde(default)]
    pub plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new() -> Self {
        Self { plans: Vec::new() }
    }

    pub fn add(&mut self, plan: Plan) {
        self.plans.push(plan);
    }

    /// Find a plan by product id
    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn by_price_id(&self, price_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.price_id == price_id)
    }

    /// Case-insensitive lookup by display name
    pub fn by_name(&self, name: &str) -> Option<&Plan> {
        self.plans
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn active_plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter().filter(|p| p.active)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
