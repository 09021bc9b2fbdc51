//! Invoice domain entity
//!
//! An invoice always belongs to exactly one customer; its effective owner is
//! that customer's user. `chrono` is the sequential invoice number exposed
//! through the increment action.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::customer::CustomerId;

/// Unique identifier for an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InvoiceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Settled invoices no longer count toward the unpaid aggregate.
    pub fn is_settled(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Sent => write!(f, "SENT"),
            InvoiceStatus::Paid => write!(f, "PAID"),
            InvoiceStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SENT" => Ok(InvoiceStatus::Sent),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

/// An invoice sent to a customer
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub amount: Decimal,
    pub sent_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    /// Sequential invoice number, strictly positive
    pub chrono: i64,
    pub customer_id: CustomerId,
}

/// Data needed to create a new invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub amount: Decimal,
    pub sent_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub chrono: i64,
    pub customer_id: CustomerId,
}

/// Field updates for an invoice; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct InvoiceChanges {
    pub amount: Option<Decimal>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: Option<InvoiceStatus>,
    pub chrono: Option<i64>,
    pub customer_id: Option<CustomerId>,
}
