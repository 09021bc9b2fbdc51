//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::entities::{
    Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, User, UserId,
};

/// Create a test user with default values
pub fn test_user() -> User {
    User {
        id: UserId::new(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        api_key_hash: "abc123hash".to_string(),
        created_at: Utc::now(),
        last_seen_at: None,
    }
}

/// Create a second, distinct test user (for owner-scoping tests)
pub fn test_other_user() -> User {
    User {
        id: UserId::new(),
        first_name: "John".to_string(),
        last_name: "Smith".to_string(),
        email: "john@example.com".to_string(),
        api_key_hash: "def456hash".to_string(),
        created_at: Utc::now(),
        last_seen_at: None,
    }
}

/// Create a test customer owned by the given user
pub fn test_customer(owner: &User) -> Customer {
    Customer {
        id: CustomerId::new(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        company: None,
        user_id: owner.id,
        created_at: Utc::now(),
    }
}

/// Create a test invoice for the given customer
pub fn test_invoice(customer: &Customer) -> Invoice {
    test_invoice_with(customer, dec!(100.00), InvoiceStatus::Sent)
}

/// Create a test invoice with a specific amount and status
pub fn test_invoice_with(customer: &Customer, amount: Decimal, status: InvoiceStatus) -> Invoice {
    Invoice {
        id: InvoiceId::new(),
        amount,
        sent_at: Utc::now(),
        status,
        chrono: 1,
        customer_id: customer.id,
    }
}
