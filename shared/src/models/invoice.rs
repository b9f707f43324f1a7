//! Invoice Model
//!
//! Invoices are immutable once created: the ledger only ever prepends new
//! ones. `total == subtotal + tax` holds at creation and is the producer's
//! responsibility; loaders never recompute it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::amount;
use super::product::CartItem;
use crate::util;

/// Walk-in customer name used when the cashier leaves the field blank
pub const DEFAULT_CUSTOMER: &str = "Consumidor Final";
/// Generic tax id for walk-in customers
pub const GENERIC_CUSTOMER_NIF: &str = "222222222222";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "Pagada", alias = "Paid")]
    Paid,
    #[serde(rename = "Pendiente", alias = "Pending")]
    Pending,
    #[serde(rename = "Cancelada", alias = "Cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Tarjeta", alias = "Card")]
    Card,
    #[serde(rename = "Efectivo", alias = "Cash")]
    Cash,
    #[serde(rename = "Transferencia", alias = "Transfer")]
    Transfer,
    #[serde(rename = "Nequi")]
    Nequi,
}

impl std::str::FromStr for PaymentMethod {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "card" | "tarjeta" => Ok(PaymentMethod::Card),
            "cash" | "efectivo" => Ok(PaymentMethod::Cash),
            "transfer" | "transferencia" => Ok(PaymentMethod::Transfer),
            "nequi" => Ok(PaymentMethod::Nequi),
            other => Err(InvoiceError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Invoice amount out of range")]
    AmountOverflow,
}

/// Invoice entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Internal folio, e.g. `F-20261019-042`
    pub folio: String,
    /// Fiscal identifier (electronic invoice UUID)
    pub uuid: String,
    /// Display date
    pub date: String,
    /// Epoch millis, authoritative for ordering and filtering
    pub timestamp: i64,
    pub customer_name: String,
    pub customer_nif: String,
    #[serde(default)]
    pub customer_email: String,
    /// Base64 data URI of the customer photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_photo: Option<String>,
    pub items: Vec<CartItem>,
    #[serde(deserialize_with = "amount::deserialize")]
    pub subtotal: i64,
    #[serde(deserialize_with = "amount::deserialize")]
    pub tax: i64,
    #[serde(deserialize_with = "amount::deserialize")]
    pub total: i64,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
}

/// Checkout form data collected at the point of sale
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub customer_name: Option<String>,
    pub customer_nif: Option<String>,
    pub customer_email: Option<String>,
    pub customer_photo: Option<String>,
    pub payment_method: PaymentMethod,
    /// Tax amount added on top of the subtotal
    pub tax: i64,
}

impl CheckoutDetails {
    pub fn new(payment_method: PaymentMethod) -> Self {
        Self {
            customer_name: None,
            customer_nif: None,
            customer_email: None,
            customer_photo: None,
            payment_method,
            tax: 0,
        }
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_tax(mut self, tax: i64) -> Self {
        self.tax = tax;
        self
    }
}

impl Invoice {
    /// Build a paid invoice from the current cart
    pub fn from_cart(cart: &[CartItem], details: CheckoutDetails) -> Result<Self, InvoiceError> {
        Self::from_cart_at(cart, details, chrono::Local::now())
    }

    pub fn from_cart_at(
        cart: &[CartItem],
        details: CheckoutDetails,
        at: chrono::DateTime<chrono::Local>,
    ) -> Result<Self, InvoiceError> {
        if cart.is_empty() {
            return Err(InvoiceError::EmptyCart);
        }

        let subtotal = cart
            .iter()
            .try_fold(0i64, |acc, item| item.line_total().and_then(|line| acc.checked_add(line)))
            .ok_or(InvoiceError::AmountOverflow)?;
        let total = subtotal
            .checked_add(details.tax)
            .ok_or(InvoiceError::AmountOverflow)?;
        let customer_name = details
            .customer_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CUSTOMER.to_string());

        Ok(Self {
            id: util::new_id(),
            folio: util::folio(at),
            uuid: util::new_id(),
            date: util::display_date(at),
            timestamp: at.timestamp_millis(),
            customer_name,
            customer_nif: details
                .customer_nif
                .unwrap_or_else(|| GENERIC_CUSTOMER_NIF.to_string()),
            customer_email: details.customer_email.unwrap_or_default(),
            customer_photo: details.customer_photo,
            items: cart.to_vec(),
            subtotal,
            tax: details.tax,
            total,
            status: InvoiceStatus::Paid,
            payment_method: details.payment_method,
        })
    }

    /// Number of units across all lines
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
