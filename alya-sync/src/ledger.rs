//! Ledger - the in-memory shop state
//!
//! Invoices, products, login history, settings and the open cart, loaded
//! from the cache at startup. Every mutation writes the affected collection
//! back to the cache before it returns, so the cache is never behind what a
//! later flush sends to a backend. Memory changes only after the cache
//! write succeeds, so the two never disagree.

use shared::models::Settings;
use shared::models::catalog::default_products;
use shared::{AppSnapshot, CartItem, Invoice, LoginEvent, Product};

use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::error::SyncResult;

type Staged = (CacheKey, serde_json::Value);

fn stage<T: serde::Serialize>(key: CacheKey, value: &T) -> Result<Staged, CacheError> {
    Ok((key, serde_json::to_value(value)?))
}

fn prepend<T: Clone>(item: T, rest: &[T]) -> Vec<T> {
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(item);
    items.extend_from_slice(rest);
    items
}

#[derive(Debug)]
pub struct Ledger {
    cache: CacheStore,
    invoices: Vec<Invoice>,
    products: Vec<Product>,
    history: Vec<LoginEvent>,
    settings: Settings,
    cart: Vec<CartItem>,
}

impl Ledger {
    /// Load every collection from the cache.
    ///
    /// A first run (no cached products) starts from the default catalog.
    pub fn load(cache: CacheStore) -> Self {
        let products = match cache.get::<Vec<Product>>(CacheKey::Products) {
            Some(products) => products,
            None => {
                let seed = default_products();
                if let Err(e) = cache.write(CacheKey::Products, &seed) {
                    tracing::warn!(error = %e, "Failed to cache default catalog");
                }
                tracing::info!(count = seed.len(), "Seeded default product catalog");
                seed
            }
        };

        let ledger = Self {
            invoices: cache.read(CacheKey::Invoices, Vec::new()),
            history: cache.read(CacheKey::History, Vec::new()),
            settings: cache.read(CacheKey::Settings, Settings::new()),
            cart: cache.read(CacheKey::Cart, Vec::new()),
            products,
            cache,
        };
        tracing::debug!(
            invoices = ledger.invoices.len(),
            products = ledger.products.len(),
            history = ledger.history.len(),
            "Ledger loaded from cache"
        );
        ledger
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn history(&self) -> &[LoginEvent] {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Newest first
    pub fn add_invoice(&mut self, invoice: Invoice) -> SyncResult<()> {
        let invoices = prepend(invoice, &self.invoices);
        self.cache.write(CacheKey::Invoices, &invoices)?;
        self.invoices = invoices;
        Ok(())
    }

    /// Replace the product with the same id, or append a new one
    pub fn upsert_product(&mut self, product: Product) -> SyncResult<()> {
        let mut products = self.products.clone();
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        self.cache.write(CacheKey::Products, &products)?;
        self.products = products;
        Ok(())
    }

    /// Returns whether a product was removed
    pub fn delete_product(&mut self, id: &str) -> SyncResult<bool> {
        if self.product(id).is_none() {
            return Ok(false);
        }
        let products: Vec<Product> = self.products.iter().filter(|p| p.id != id).cloned().collect();
        self.cache.write(CacheKey::Products, &products)?;
        self.products = products;
        Ok(true)
    }

    /// Newest first
    pub fn record_login(&mut self, event: LoginEvent) -> SyncResult<()> {
        let history = prepend(event, &self.history);
        self.cache.write(CacheKey::History, &history)?;
        self.history = history;
        Ok(())
    }

    pub fn update_settings(&mut self, settings: Settings) -> SyncResult<()> {
        self.cache.write(CacheKey::Settings, &settings)?;
        self.settings = settings;
        Ok(())
    }

    pub fn set_cart(&mut self, cart: Vec<CartItem>) -> SyncResult<()> {
        self.cache.write(CacheKey::Cart, &cart)?;
        self.cart = cart;
        Ok(())
    }

    /// Overwrite every snapshot collection (cart untouched).
    ///
    /// All four cache entries change or none do; memory is swapped only
    /// after the cache holds the new state.
    pub fn replace(&mut self, snapshot: AppSnapshot) -> SyncResult<()> {
        let staged = [
            stage(CacheKey::Invoices, &snapshot.invoices)?,
            stage(CacheKey::Products, &snapshot.products)?,
            stage(CacheKey::History, &snapshot.history)?,
            stage(CacheKey::Settings, &snapshot.settings)?,
        ];
        let previous = [
            stage(CacheKey::Invoices, &self.invoices)?,
            stage(CacheKey::Products, &self.products)?,
            stage(CacheKey::History, &self.history)?,
            stage(CacheKey::Settings, &self.settings)?,
        ];
        self.commit(&staged, &previous)?;

        let AppSnapshot {
            invoices,
            products,
            history,
            settings,
            ..
        } = snapshot;
        self.invoices = invoices;
        self.products = products;
        self.history = history;
        self.settings = settings;
        tracing::info!(
            invoices = self.invoices.len(),
            products = self.products.len(),
            "Ledger replaced from snapshot"
        );
        Ok(())
    }

    /// Write entries in order; on failure restore the ones already written
    fn commit(&self, staged: &[Staged], previous: &[Staged]) -> Result<(), CacheError> {
        for (written, (key, value)) in staged.iter().enumerate() {
            if let Err(e) = self.cache.write(*key, value) {
                tracing::warn!(key = %key, error = %e, "Cache write failed, rolling back");
                for (key, value) in &previous[..written] {
                    if let Err(rollback) = self.cache.write(*key, value) {
                        tracing::error!(key = %key, error = %rollback, "Cache rollback failed");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot::new(
            self.invoices.clone(),
            self.products.clone(),
            self.history.clone(),
            self.settings.clone(),
        )
    }
}
