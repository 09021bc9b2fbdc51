//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and the repository ports.

pub mod customer_service;
pub mod invoice_service;
pub mod user_service;

pub use customer_service::{CustomerDraft, CustomerService, CustomerWithInvoices};
pub use invoice_service::{InvoiceDraft, InvoiceService, InvoiceWithCustomer};
pub use user_service::{generate_api_key, hash_api_key, UserDraft, UserService};
