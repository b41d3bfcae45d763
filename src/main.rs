use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use rust_decimal::Decimal;
use std::path::PathBuf;
use stripe_facade::application::facade::{ChargeOptions, Facade};
use stripe_facade::config::FacadeConfig;
use stripe_facade::domain::gateway::{CardFields, ExtraParams, Metadata};
use stripe_facade::domain::money::OrderTotal;
use stripe_facade::domain::order::{Order, PaymentSource};
use stripe_facade::domain::ports::{OrderStoreBox, PaymentSourceStoreBox};
use stripe_facade::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentSourceStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize (or, in one-step mode, charge) an order total
    Charge {
        #[arg(long)]
        order_number: String,
        /// Tax-inclusive total in major units, e.g. 10.99
        #[arg(long)]
        amount: Decimal,
        /// Card token or stored card id
        #[arg(long)]
        source: String,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Charge metadata as key=value, repeatable
        #[arg(long = "metadata", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
        /// Extra API parameter as key=value, repeatable
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        /// Store the order and its payment source after a successful charge
        #[arg(long, requires = "order_id")]
        record: bool,
        #[arg(long)]
        order_id: Option<u64>,
    },
    /// Capture a previously authorized charge for an order
    Capture {
        #[arg(long)]
        order_number: String,
        /// Extra API parameter as key=value, repeatable (e.g. amount=500)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Create a customer profile from a card token
    CreateCustomer {
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the card behind a token
    CardFromToken {
        #[arg(long)]
        token: String,
    },
    /// Attach a card token to an existing customer
    AddCard {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        token: String,
    },
    /// Find a customer's card id by fingerprint
    CardFromFingerprint {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        fingerprint: String,
    },
    /// Tokenize raw card data (sandbox accounts only)
    TestToken {
        #[arg(long)]
        number: String,
        #[arg(long)]
        exp_month: u32,
        #[arg(long)]
        exp_year: i32,
        #[arg(long)]
        cvc: String,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, PaymentSourceStoreBox)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = stripe_facade::infrastructure::rocksdb::RocksDBStore::open(path)
                .into_diagnostic()?;
            Ok((Box::new(store.clone()), Box::new(store)))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

/// Stores the order and its payment source for an authorized charge.
///
/// Errors name the charge reference, since the charge already exists remotely.
async fn record_charge(
    orders: OrderStoreBox,
    sources: PaymentSourceStoreBox,
    order: Order,
    reference: &str,
) -> Result<()> {
    let unrecorded = format!(
        "Charge {reference} for order {} was authorized but could not be recorded",
        order.number
    );
    sources
        .save(PaymentSource::stripe(&order, reference))
        .await
        .into_diagnostic()
        .wrap_err(unrecorded.clone())?;
    orders
        .store(order)
        .await
        .into_diagnostic()
        .wrap_err(unrecorded)?;
    Ok(())
}

fn in_memory_stores() -> (OrderStoreBox, PaymentSourceStoreBox) {
    (
        Box::new(InMemoryOrderStore::new()),
        Box::new(InMemoryPaymentSourceStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = FacadeConfig::from_env().into_diagnostic()?;
    let (orders, sources) = open_stores(cli.db_path)?;
    let facade = Facade::stripe(config, orders, sources).into_diagnostic()?;

    match cli.command {
        Command::Charge {
            order_number,
            amount,
            source,
            customer,
            currency,
            description,
            metadata,
            params,
            record,
            order_id,
        } => {
            let currency = currency.map(|c| c.to_lowercase());
            let order_currency = currency
                .clone()
                .unwrap_or_else(|| facade.config().currency.clone());
            let total = OrderTotal::tax_inclusive(amount);
            let options = ChargeOptions {
                customer,
                currency,
                description,
                metadata: Some(metadata.into_iter().collect::<Metadata>()),
                extra: params,
            };

            let reference = facade
                .charge(&order_number, &total, &source, options)
                .await
                .into_diagnostic()?;

            println!("{reference}");

            if record && let Some(order_id) = order_id {
                let (orders, sources) = facade.into_stores();
                let order = Order::new(order_id, &order_number, total, order_currency);
                record_charge(orders, sources, order, &reference).await?;
            }
        }
        Command::Capture {
            order_number,
            params,
        } => {
            let extra: ExtraParams = params;
            facade
                .capture(&order_number, &extra)
                .await
                .into_diagnostic()?;
            println!("captured {order_number}");
        }
        Command::CreateCustomer {
            token,
            email,
            description,
        } => {
            let customer_id = facade
                .create_customer(&token, &email, description.as_deref())
                .await
                .into_diagnostic()?;
            println!("{customer_id}");
        }
        Command::CardFromToken { token } => {
            let card = facade.get_card_from_token(&token).await.into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&card).into_diagnostic()?);
        }
        Command::AddCard { customer, token } => {
            facade
                .add_card_to_user(&customer, &token)
                .await
                .into_diagnostic()?;
            println!("added card to {customer}");
        }
        Command::CardFromFingerprint {
            customer,
            fingerprint,
        } => {
            if let Some(card_id) = facade
                .retrieve_customer_card_from_fingerprint(&customer, &fingerprint)
                .await
                .into_diagnostic()?
            {
                println!("{card_id}");
            }
        }
        Command::TestToken {
            number,
            exp_month,
            exp_year,
            cvc,
        } => {
            let token = facade
                .get_token_from_card(&CardFields {
                    number,
                    exp_month,
                    exp_year,
                    cvc,
                })
                .await
                .into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&token).into_diagnostic()?);
        }
    }

    Ok(())
}
