use crate::domain::order::{Order, PaymentSource};
use crate::domain::ports::{OrderStore, PaymentSourceStore};
use crate::error::StoreError;
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing orders, keyed by order number.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing payment sources, keyed by order id.
pub const CF_PAYMENT_SOURCES: &str = "payment_sources";

/// A persistent store implementation using RocksDB.
///
/// Holds both `Order` and `PaymentSource` records as JSON in separate Column
/// Families. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_sources = ColumnFamilyDescriptor::new(CF_PAYMENT_SOURCES, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_sources])
            .map_err(StoreError::backend)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<(), StoreError> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key, bytes).map_err(StoreError::backend)
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>, StoreError> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        match self.db.get_cf(&cf, key).map_err(StoreError::backend)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn missing_cf(name: &str) -> StoreError {
    StoreError::Io(std::io::Error::other(format!(
        "column family '{name}' not found"
    )))
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn store(&self, order: Order) -> Result<(), StoreError> {
        self.put(CF_ORDERS, order.number.as_bytes(), &order)
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, StoreError> {
        self.fetch(CF_ORDERS, number.as_bytes())
    }
}

#[async_trait]
impl PaymentSourceStore for RocksDBStore {
    async fn save(&self, source: PaymentSource) -> Result<(), StoreError> {
        self.put(CF_PAYMENT_SOURCES, &source.order_id.to_be_bytes(), &source)
    }

    async fn get_for_order(&self, order_id: u64) -> Result<Option<PaymentSource>, StoreError> {
        self.fetch(CF_PAYMENT_SOURCES, &order_id.to_be_bytes())
    }
}
