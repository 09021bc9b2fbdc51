//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod customers;
pub mod invoices;
pub mod users;

pub use customers::{
    create_customer, delete_customer, get_customer, list_customer_invoices, list_customers,
    patch_customer, put_customer,
};
pub use invoices::{
    create_invoice, delete_invoice, get_invoice, increment_invoice, list_invoices, patch_invoice,
    put_invoice,
};
pub use users::{get_user, register};
