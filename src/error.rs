use thiserror::Error;

/// Message shown to the customer when the card issuer refuses a charge.
pub const DECLINE_MESSAGE: &str =
    "The transaction was declined by your bank - please check your bankcard details and try again";

/// Message shown to the customer for every other gateway failure during a charge.
pub const GATEWAY_ERROR_MESSAGE: &str =
    "An error occurred when communicating with the payment gateway.";

pub type Result<T> = std::result::Result<T, FacadeError>;

/// Errors surfaced by the [`Facade`](crate::application::facade::Facade).
///
/// `GatewayDeclined` and `GatewayError` are safe to show to a customer: their
/// messages are fixed and never contain processor detail.
#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("{}", DECLINE_MESSAGE)]
    GatewayDeclined { order_number: String },

    #[error("{}", GATEWAY_ERROR_MESSAGE)]
    GatewayError { order_number: String },

    #[error("Capture failure: order {order_number} does not exist")]
    OrderNotFound { order_number: String },

    #[error("Capture failure: could not find payment source for order {order_number}")]
    PaymentSourceNotFound { order_number: String },

    #[error("Capture failure: payment source for order {order_number} has no charge reference")]
    MissingChargeReference { order_number: String },

    #[error("Capture failure: gateway rejected capture for order {order_number}")]
    CaptureFailed {
        order_number: String,
        #[source]
        source: GatewayFailure,
    },

    #[error(
        "Charge {reference} for order {order_number} was captured but the capture date could not be recorded"
    )]
    CapturedButUnrecorded {
        order_number: String,
        reference: String,
        #[source]
        source: StoreError,
    },

    #[error("Token {token} does not carry a card")]
    TokenWithoutCard { token: String },

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: rust_decimal::Decimal,
        reason: &'static str,
    },

    #[error("Parameter '{key}' is set by the charge itself and cannot be passed as an extra")]
    ReservedParameter { key: String },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayFailure),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A failed call to the remote payment API.
#[derive(Error, Debug)]
pub enum GatewayFailure {
    /// The card was refused (Stripe `card_error`).
    #[error("card error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Card {
        code: Option<String>,
        decline_code: Option<String>,
        message: String,
    },

    #[error("{kind} (HTTP {status}): {message}")]
    Api {
        kind: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected gateway response: {0}")]
    Decode(String),

    /// An object id that cannot be used as a single URL path segment.
    #[error("invalid object id '{0}'")]
    InvalidId(String),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl GatewayFailure {
    pub fn is_card_error(&self) -> bool {
        matches!(self, GatewayFailure::Card { .. })
    }
}

/// A failed read or write against the order / payment-source records.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}
