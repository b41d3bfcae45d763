use crate::config::FacadeConfig;
use crate::domain::gateway::{
    Card, CardFields, ChargeRequest, ExtraParams, Metadata, NewCustomer, Token, is_charge_field,
};
use crate::domain::money::{MinorUnits, OrderTotal};
use crate::domain::ports::{OrderStoreBox, PaymentGatewayBox, PaymentSourceStoreBox};
use crate::error::{FacadeError, GatewayFailure, Result};
use crate::infrastructure::stripe::StripeClient;
use chrono::Utc;
use tracing::{error, info, warn};

/// Optional arguments to [`Facade::charge`].
#[derive(Debug, Clone, Default)]
pub struct ChargeOptions {
    /// Remote customer the source belongs to.
    pub customer: Option<String>,
    /// Overrides the configured default currency.
    pub currency: Option<String>,
    pub description: Option<String>,
    /// Replaces the default `{"order_number": ...}` metadata when non-empty.
    pub metadata: Option<Metadata>,
    pub extra: ExtraParams,
}

/// Adapter between the order/payment-source records and the remote payment API.
///
/// Each operation is a direct, sequential call into the gateway. `charge`
/// translates gateway failures into customer-safe errors; `capture` is the only
/// operation that writes a local record.
pub struct Facade {
    config: FacadeConfig,
    gateway: PaymentGatewayBox,
    orders: OrderStoreBox,
    sources: PaymentSourceStoreBox,
}

impl Facade {
    /// Creates a new `Facade` instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Currency and capture settings.
    /// * `gateway` - The remote payment API.
    /// * `orders` - Lookup of orders by number.
    /// * `sources` - The payment sources recorded against orders.
    pub fn new(
        config: FacadeConfig,
        gateway: PaymentGatewayBox,
        orders: OrderStoreBox,
        sources: PaymentSourceStoreBox,
    ) -> Self {
        Self {
            config,
            gateway,
            orders,
            sources,
        }
    }

    /// Creates a `Facade` talking to Stripe with the given configuration.
    pub fn stripe(
        config: FacadeConfig,
        orders: OrderStoreBox,
        sources: PaymentSourceStoreBox,
    ) -> Result<Self> {
        config.validate()?;
        let client = StripeClient::new(&config)?;
        Ok(Self::new(config, Box::new(client), orders, sources))
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// Consumes the facade and hands back its record stores.
    pub fn into_stores(self) -> (OrderStoreBox, PaymentSourceStoreBox) {
        (self.orders, self.sources)
    }

    /// Authorizes `total.incl_tax` against `source` and returns the charge reference.
    ///
    /// Extra parameters may not repeat a field the charge sets itself; such a
    /// request fails with [`FacadeError::ReservedParameter`] before any call.
    /// The charge is captured immediately only when the configuration asks for
    /// one-step processing. Card declines become [`FacadeError::GatewayDeclined`],
    /// every other gateway failure [`FacadeError::GatewayError`]; the
    /// processor's detail only goes to the log.
    pub async fn charge(
        &self,
        order_number: &str,
        total: &OrderTotal,
        source: &str,
        options: ChargeOptions,
    ) -> Result<String> {
        info!(order_number, "Authorizing payment via stripe");

        let amount = MinorUnits::from_major(total.incl_tax)?;
        if let Some((key, _)) = options.extra.iter().find(|(key, _)| is_charge_field(key)) {
            return Err(FacadeError::ReservedParameter { key: key.clone() });
        }
        let metadata = match options.metadata {
            Some(metadata) if !metadata.is_empty() => metadata,
            _ => Metadata::from([("order_number".to_string(), order_number.to_string())]),
        };
        let request = ChargeRequest {
            amount,
            currency: options
                .currency
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| self.config.currency.clone()),
            source: source.to_string(),
            customer: options.customer,
            description: options.description,
            metadata,
            capture: self.config.charge_and_capture_in_one_step,
            extra: options.extra,
        };

        match self.gateway.create_charge(&request).await {
            Ok(charge) => {
                info!(
                    order_number,
                    charge_id = %charge.id,
                    amount = amount.value(),
                    captured = charge.captured,
                    "Payment authorized via stripe"
                );
                Ok(charge.id)
            }
            Err(e) if e.is_card_error() => {
                warn!(order_number, error = %e, "Payment declined by stripe");
                Err(FacadeError::GatewayDeclined {
                    order_number: order_number.to_string(),
                })
            }
            Err(e) => {
                error!(order_number, error = %e, "Payment gateway request failed");
                Err(FacadeError::GatewayError {
                    order_number: order_number.to_string(),
                })
            }
        }
    }

    /// Captures the funds authorized for an order and records the capture date.
    ///
    /// If the remote capture succeeds but the payment source cannot be saved
    /// afterwards, the charge stays captured remotely and
    /// [`FacadeError::CapturedButUnrecorded`] is returned.
    pub async fn capture(&self, order_number: &str, extra: &ExtraParams) -> Result<()> {
        info!(order_number, "Initiating payment capture via stripe");

        let order = self
            .orders
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| FacadeError::OrderNotFound {
                order_number: order_number.to_string(),
            })?;

        let mut payment_source = self.sources.get_for_order(order.id).await?.ok_or_else(|| {
            FacadeError::PaymentSourceNotFound {
                order_number: order_number.to_string(),
            }
        })?;

        if payment_source.reference.is_empty() {
            return Err(FacadeError::MissingChargeReference {
                order_number: order_number.to_string(),
            });
        }
        let charge_id = payment_source.reference.clone();

        let capture_failed = |source: GatewayFailure| FacadeError::CaptureFailed {
            order_number: order_number.to_string(),
            source,
        };
        let charge = self
            .gateway
            .retrieve_charge(&charge_id)
            .await
            .map_err(capture_failed)?;
        self.gateway
            .capture_charge(&charge.id, extra)
            .await
            .map_err(capture_failed)?;

        payment_source.mark_captured(Utc::now());
        if let Err(e) = self.sources.save(payment_source).await {
            error!(
                order_number,
                order_id = order.id,
                stripe_ref = %charge_id,
                error = %e,
                "Payment captured via stripe but the capture date could not be recorded"
            );
            return Err(FacadeError::CapturedButUnrecorded {
                order_number: order_number.to_string(),
                reference: charge_id,
                source: e,
            });
        }

        info!(
            order_number,
            order_id = order.id,
            stripe_ref = %charge_id,
            "Payment captured via stripe"
        );
        Ok(())
    }

    /// Creates a remote customer profile holding `token`'s card; returns its id.
    pub async fn create_customer(
        &self,
        token: &str,
        email: &str,
        description: Option<&str>,
    ) -> Result<String> {
        let customer = self
            .gateway
            .create_customer(&NewCustomer {
                source: token.to_string(),
                email: email.to_string(),
                description: description.map(str::to_string),
            })
            .await?;
        info!(customer_id = %customer.id, "Customer created via stripe");
        Ok(customer.id)
    }

    pub async fn get_card_from_token(&self, token: &str) -> Result<Card> {
        self.gateway
            .retrieve_token(token)
            .await?
            .card
            .ok_or_else(|| FacadeError::TokenWithoutCard {
                token: token.to_string(),
            })
    }

    pub async fn add_card_to_user(&self, customer_id: &str, token: &str) -> Result<()> {
        let card = self.gateway.add_customer_source(customer_id, token).await?;
        info!(customer_id, card_id = %card.id, "Card added to customer via stripe");
        Ok(())
    }

    /// Finds the customer's stored card with the given fingerprint.
    ///
    /// Falls back to the customer's default source when no card matches, which
    /// may itself be `None`.
    pub async fn retrieve_customer_card_from_fingerprint(
        &self,
        customer_id: &str,
        fingerprint: &str,
    ) -> Result<Option<String>> {
        let customer = self.gateway.retrieve_customer(customer_id).await?;

        let mut starting_after: Option<String> = None;
        loop {
            let page = self
                .gateway
                .list_customer_cards(customer_id, starting_after.as_deref())
                .await?;

            if let Some(card) = page
                .data
                .iter()
                .find(|card| card.fingerprint.as_deref() == Some(fingerprint))
            {
                return Ok(Some(card.id.clone()));
            }

            match page.data.last() {
                Some(last) if page.has_more => starting_after = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(customer.default_source)
    }

    /// Tokenizes raw card data.
    ///
    /// WARNING: for automated tests against the processor's sandbox only. Real
    /// card numbers must never pass through application servers.
    pub async fn get_token_from_card(&self, card: &CardFields) -> Result<Token> {
        warn!("Tokenizing raw card data; this must only happen against a test account");
        Ok(self.gateway.create_card_token(card).await?)
    }
}
