use super::money::OrderTotal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source type recorded on payment sources created for Stripe charges.
pub const STRIPE_SOURCE_TYPE: &str = "Stripe";

/// A placed order, owned by the checkout flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// The customer-facing order number; unique across orders.
    pub number: String,
    pub total: OrderTotal,
    pub currency: String,
}

impl Order {
    pub fn new(id: u64, number: impl Into<String>, total: OrderTotal, currency: impl Into<String>) -> Self {
        Self {
            id,
            number: number.into(),
            total,
            currency: currency.into(),
        }
    }
}

/// How an order was paid: one record per charge, pointing at the remote charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSource {
    pub order_id: u64,
    pub source_type: String,
    pub currency: String,
    pub amount_allocated: Decimal,
    /// Remote charge identifier.
    pub reference: String,
    /// Set once the charge has been captured.
    pub date_captured: Option<DateTime<Utc>>,
}

impl PaymentSource {
    /// A payment source for a Stripe charge that has not been captured yet.
    pub fn stripe(order: &Order, reference: impl Into<String>) -> Self {
        Self {
            order_id: order.id,
            source_type: STRIPE_SOURCE_TYPE.to_string(),
            currency: order.currency.clone(),
            amount_allocated: order.total.incl_tax,
            reference: reference.into(),
            date_captured: None,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.date_captured.is_some()
    }

    pub fn mark_captured(&mut self, at: DateTime<Utc>) {
        self.date_captured = Some(at);
    }
}
