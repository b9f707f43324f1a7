//! Shared types for the Dulce Alya point of sale
//!
//! Data model of the persisted snapshot (invoices, products, login
//! history, settings) plus time and id helpers used by every crate.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    AppSnapshot, CartItem, CheckoutDetails, Invoice, InvoiceError, InvoiceStatus, LoginEvent,
    LoginOutcome, PaymentMethod, Product, ProductCategory, SnapshotError, SNAPSHOT_VERSION,
};
