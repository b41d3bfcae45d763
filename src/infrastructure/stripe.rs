use crate::config::FacadeConfig;
use crate::domain::gateway::{
    Card, CardFields, CardList, Charge, ChargeRequest, Customer, ExtraParams, NewCustomer, Token,
};
use crate::domain::ports::PaymentGateway;
use crate::error::GatewayFailure;
use async_trait::async_trait;
use serde::Deserialize;
use reqwest::Url;
use serde::de::DeserializeOwned;

/// Page size used when listing a customer's cards (the API maximum).
pub const CARD_PAGE_LIMIT: &str = "100";

type Form = Vec<(String, String)>;

/// [`PaymentGateway`] backed by the Stripe REST API.
///
/// Requests are form-encoded and authenticated with the secret key as a
/// bearer token. Error bodies are mapped to [`GatewayFailure`].
pub struct StripeClient {
    http: reqwest::Client,
    api_base: Url,
    secret_key: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_failure(self, status: u16) -> GatewayFailure {
        let message = self.message.unwrap_or_default();
        match self.kind.as_deref() {
            Some("card_error") => GatewayFailure::Card {
                code: self.code,
                decline_code: self.decline_code,
                message,
            },
            kind => GatewayFailure::Api {
                kind: kind.unwrap_or("api_error").to_string(),
                status,
                message,
            },
        }
    }
}

impl StripeClient {
    pub fn new(config: &FacadeConfig) -> Result<Self, GatewayFailure> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let api_base = Url::parse(&config.api_base)
            .map_err(|e| GatewayFailure::InvalidBaseUrl(format!("{}: {e}", config.api_base)))?;
        if api_base.cannot_be_a_base() {
            return Err(GatewayFailure::InvalidBaseUrl(config.api_base.clone()));
        }

        Ok(Self {
            http: builder.build()?,
            api_base,
            secret_key: config.secret_key.clone(),
        })
    }

    /// Builds `{api_base}/v1/{segments...}`.
    ///
    /// Every segment is percent-encoded on its own, so an id containing `/`,
    /// `?` or `#` stays inside its segment.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayFailure> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(GatewayFailure::InvalidId((*bad).to_string()));
        }

        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayFailure::InvalidBaseUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, form: &Form) -> Result<T, GatewayFailure> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayFailure> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayFailure> {
        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|e| GatewayFailure::Decode(format!("invalid response body: {e}")));
        }

        match serde_json::from_slice::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(envelope.error.into_failure(status.as_u16())),
            Err(_) => Err(GatewayFailure::Api {
                kind: "http_error".to_string(),
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

/// Encodes a charge request the way the charges endpoint expects it.
pub fn charge_form(request: &ChargeRequest) -> Form {
    let mut form: Form = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        ("source".to_string(), request.source.clone()),
        ("capture".to_string(), request.capture.to_string()),
    ];
    if let Some(customer) = &request.customer {
        form.push(("customer".to_string(), customer.clone()));
    }
    if let Some(description) = &request.description {
        form.push(("description".to_string(), description.clone()));
    }
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form.extend(request.extra.iter().cloned());
    form
}

fn customer_form(customer: &NewCustomer) -> Form {
    let mut form: Form = vec![
        ("source".to_string(), customer.source.clone()),
        ("email".to_string(), customer.email.clone()),
    ];
    if let Some(description) = &customer.description {
        form.push(("description".to_string(), description.clone()));
    }
    form
}

fn card_form(card: &CardFields) -> Form {
    vec![
        ("card[number]".to_string(), card.number.clone()),
        ("card[exp_month]".to_string(), card.exp_month.to_string()),
        ("card[exp_year]".to_string(), card.exp_year.to_string()),
        ("card[cvc]".to_string(), card.cvc.clone()),
    ]
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_charge(&self, request: &ChargeRequest) -> Result<Charge, GatewayFailure> {
        self.post(self.url(&["charges"])?, &charge_form(request))
            .await
    }

    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge, GatewayFailure> {
        self.get(self.url(&["charges", charge_id])?, &[]).await
    }

    async fn capture_charge(
        &self,
        charge_id: &str,
        extra: &ExtraParams,
    ) -> Result<Charge, GatewayFailure> {
        self.post(self.url(&["charges", charge_id, "capture"])?, extra)
            .await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, GatewayFailure> {
        self.post(self.url(&["customers"])?, &customer_form(customer))
            .await
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, GatewayFailure> {
        self.get(self.url(&["customers", customer_id])?, &[])
            .await
    }

    async fn add_customer_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> Result<Card, GatewayFailure> {
        let form: Form = vec![("source".to_string(), token.to_string())];
        self.post(self.url(&["customers", customer_id, "sources"])?, &form)
            .await
    }

    async fn list_customer_cards(
        &self,
        customer_id: &str,
        starting_after: Option<&str>,
    ) -> Result<CardList, GatewayFailure> {
        let mut query = vec![("object", "card"), ("limit", CARD_PAGE_LIMIT)];
        if let Some(card_id) = starting_after {
            query.push(("starting_after", card_id));
        }
        self.get(self.url(&["customers", customer_id, "sources"])?, &query)
            .await
    }

    async fn create_card_token(&self, card: &CardFields) -> Result<Token, GatewayFailure> {
        self.post(self.url(&["tokens"])?, &card_form(card)).await
    }

    async fn retrieve_token(&self, token: &str) -> Result<Token, GatewayFailure> {
        self.get(self.url(&["tokens", token])?, &[]).await
    }
}
