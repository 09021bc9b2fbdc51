//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod customer;
pub mod invoice;
pub mod user;

pub use customer::{
    total_amount, unpaid_amount, Customer, CustomerChanges, CustomerId, NewCustomer,
};
pub use invoice::{Invoice, InvoiceChanges, InvoiceId, InvoiceStatus, NewInvoice};
pub use user::{NewUser, User, UserId};
