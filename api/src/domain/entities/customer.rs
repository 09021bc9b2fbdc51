//! Customer domain entity and the aggregate calculator
//!
//! A customer belongs to exactly one user and owns a set of invoices. The
//! `totalAmount` / `unpaidAmount` aggregates are pure functions over the
//! customer's current invoice set, recomputed on demand and never stored.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoice::Invoice;
use super::user::UserId;

/// Unique identifier for a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CustomerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A customer account owned by a user
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    /// Owning user; required at all times after creation
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new customer
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub user_id: UserId,
}

/// Field updates for a customer; `None` leaves a field unchanged.
///
/// `company` is optional-nullable: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<Option<String>>,
}

/// Sum of all invoice amounts, rounded half-up to 2 decimal places.
/// An empty invoice set yields 0.00.
pub fn total_amount(invoices: &[Invoice]) -> Decimal {
    round2(invoices.iter().map(|invoice| invoice.amount).sum())
}

/// Sum of amounts over invoices that are neither PAID nor CANCELLED,
/// rounded half-up to 2 decimal places. Empty or fully settled set yields 0.00.
pub fn unpaid_amount(invoices: &[Invoice]) -> Decimal {
    round2(
        invoices
            .iter()
            .filter(|invoice| !invoice.status.is_settled())
            .map(|invoice| invoice.amount)
            .sum(),
    )
}

fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{InvoiceId, InvoiceStatus};
    use rust_decimal_macros::dec;

    fn invoice(amount: Decimal, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            amount,
            sent_at: Utc::now(),
            status,
            chrono: 1,
            customer_id: CustomerId::new(),
        }
    }

    #[test]
    fn empty_invoice_set_yields_zero() {
        assert_eq!(total_amount(&[]), dec!(0.00));
        assert_eq!(unpaid_amount(&[]), dec!(0.00));
    }

    #[test]
    fn total_sums_all_invoices_with_half_up_rounding() {
        let invoices = vec![
            invoice(dec!(100), InvoiceStatus::Sent),
            invoice(dec!(50), InvoiceStatus::Paid),
            invoice(dec!(25.005), InvoiceStatus::Cancelled),
        ];

        assert_eq!(total_amount(&invoices), dec!(175.01));
    }

    #[test]
    fn unpaid_excludes_paid_and_cancelled() {
        let invoices = vec![
            invoice(dec!(100), InvoiceStatus::Sent),
            invoice(dec!(50), InvoiceStatus::Paid),
            invoice(dec!(25.005), InvoiceStatus::Cancelled),
        ];

        assert_eq!(unpaid_amount(&invoices), dec!(100.00));
    }

    #[test]
    fn fully_settled_set_is_unpaid_zero() {
        let invoices = vec![
            invoice(dec!(10), InvoiceStatus::Paid),
            invoice(dec!(20), InvoiceStatus::Cancelled),
        ];

        assert_eq!(unpaid_amount(&invoices), dec!(0.00));
        assert_eq!(total_amount(&invoices), dec!(30.00));
    }

    #[test]
    fn aggregates_are_idempotent() {
        let invoices = vec![
            invoice(dec!(12.345), InvoiceStatus::Sent),
            invoice(dec!(0.01), InvoiceStatus::Sent),
        ];

        assert_eq!(total_amount(&invoices), total_amount(&invoices));
        assert_eq!(unpaid_amount(&invoices), unpaid_amount(&invoices));
    }
}
