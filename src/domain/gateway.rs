//! Records exchanged with the remote payment API.
//!
//! Response types deserialize straight from the processor's JSON and ignore
//! fields they do not name.

use super::money::MinorUnits;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form key/value pairs attached to a charge.
pub type Metadata = BTreeMap<String, String>;

/// Additional form parameters forwarded to the remote API as-is.
pub type ExtraParams = Vec<(String, String)>;

/// Form fields a [`ChargeRequest`] sets from its own members.
const CHARGE_FIELDS: [&str; 6] = ["amount", "currency", "source", "customer", "description", "capture"];

/// Whether `key` would collide with a field the charge request already sends.
pub fn is_charge_field(key: &str) -> bool {
    CHARGE_FIELDS.contains(&key) || key == "metadata" || key.starts_with("metadata[")
}

/// A request to create (authorize, and optionally capture) a charge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub amount: MinorUnits,
    pub currency: String,
    /// Card token or stored card id.
    pub source: String,
    pub customer: Option<String>,
    pub description: Option<String>,
    pub metadata: Metadata,
    /// `false` authorizes only; the funds are held until captured.
    pub capture: bool,
    pub extra: ExtraParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    /// Card token the customer profile is created with.
    pub source: String,
    pub email: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub exp_month: Option<u32>,
    #[serde(default)]
    pub exp_year: Option<i32>,
    /// Stable across tokens of the same card number.
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

/// One page of a customer's stored cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardList {
    pub data: Vec<Card>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub card: Option<Card>,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub livemode: bool,
}

/// Raw card data. Only ever built by test code talking to a sandbox.
#[derive(Clone, PartialEq)]
pub struct CardFields {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvc: String,
}

impl fmt::Debug for CardFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last4 = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("CardFields")
            .field("number", &format_args!("****{last4}"))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"***")
            .finish()
    }
}
