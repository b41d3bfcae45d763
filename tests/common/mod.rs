#![allow(dead_code)]

use rust_decimal_macros::dec;
use serde_json::{Value, json};
use stripe_facade::application::facade::Facade;
use stripe_facade::config::FacadeConfig;
use stripe_facade::domain::money::OrderTotal;
use stripe_facade::domain::order::{Order, PaymentSource};
use stripe_facade::domain::ports::{OrderStore, PaymentSourceStore};
use stripe_facade::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentSourceStore};
use wiremock::MockServer;

pub const SECRET_KEY: &str = "sk_test_123";

pub struct Harness {
    pub facade: Facade,
    pub orders: InMemoryOrderStore,
    pub sources: InMemoryPaymentSourceStore,
}

pub fn config_for(server: &MockServer) -> FacadeConfig {
    FacadeConfig::new(SECRET_KEY).with_api_base(server.uri())
}

pub fn harness(config: FacadeConfig) -> Harness {
    let orders = InMemoryOrderStore::new();
    let sources = InMemoryPaymentSourceStore::new();
    let facade = Facade::stripe(config, Box::new(orders.clone()), Box::new(sources.clone()))
        .expect("valid config");
    Harness {
        facade,
        orders,
        sources,
    }
}

/// Stores an order and an uncaptured payment source pointing at `reference`.
pub async fn seed_order(h: &Harness, id: u64, number: &str, reference: &str) -> Order {
    let order = Order::new(id, number, OrderTotal::tax_inclusive(dec!(10.99)), "usd");
    h.sources
        .save(PaymentSource::stripe(&order, reference))
        .await
        .unwrap();
    h.orders.store(order.clone()).await.unwrap();
    order
}

pub fn charge_json(id: &str, captured: bool) -> Value {
    json!({
        "id": id,
        "object": "charge",
        "amount": 1099,
        "currency": "usd",
        "captured": captured,
        "status": "succeeded",
        "metadata": {}
    })
}

pub fn card_json(id: &str, fingerprint: &str) -> Value {
    json!({
        "id": id,
        "object": "card",
        "brand": "Visa",
        "last4": "4242",
        "exp_month": 12,
        "exp_year": 2030,
        "fingerprint": fingerprint,
        "funding": "credit",
        "country": "US"
    })
}

pub fn card_error_json() -> Value {
    json!({
        "error": {
            "type": "card_error",
            "code": "card_declined",
            "decline_code": "insufficient_funds",
            "message": "Your card has insufficient funds."
        }
    })
}

pub fn api_error_json(kind: &str, message: &str) -> Value {
    json!({
        "error": {
            "type": kind,
            "message": message
        }
    })
}
