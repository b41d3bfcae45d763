use super::gateway::{
    Card, CardFields, CardList, Charge, ChargeRequest, Customer, ExtraParams, NewCustomer, Token,
};
use super::order::{Order, PaymentSource};
use crate::error::{GatewayFailure, StoreError};
use async_trait::async_trait;

/// Read access to orders by number.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<(), StoreError>;
    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, StoreError>;
}

/// Read/write access to the payment source recorded for an order.
#[async_trait]
pub trait PaymentSourceStore: Send + Sync {
    async fn save(&self, source: PaymentSource) -> Result<(), StoreError>;
    async fn get_for_order(&self, order_id: u64) -> Result<Option<PaymentSource>, StoreError>;
}

/// The remote card-processing API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: &ChargeRequest) -> Result<Charge, GatewayFailure>;
    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge, GatewayFailure>;
    async fn capture_charge(
        &self,
        charge_id: &str,
        extra: &ExtraParams,
    ) -> Result<Charge, GatewayFailure>;

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, GatewayFailure>;
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, GatewayFailure>;
    async fn add_customer_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<Card, GatewayFailure>;
    /// One page of the customer's cards, starting after the given card id.
    async fn list_customer_cards(
        &self,
        customer_id: &str,
        starting_after: Option<&str>,
    ) -> Result<CardList, GatewayFailure>;

    async fn create_card_token(&self, card: &CardFields) -> Result<Token, GatewayFailure>;
    async fn retrieve_token(&self, token: &str) -> Result<Token, GatewayFailure>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PaymentSourceStoreBox = Box<dyn PaymentSourceStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
