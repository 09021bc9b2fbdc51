//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::entities::{
    Customer, CustomerChanges, CustomerId, Invoice, InvoiceChanges, InvoiceId, NewCustomer,
    NewInvoice, NewUser, User, UserId,
};
use crate::error::DomainError;

/// Invoice collections are paginated at a fixed page size.
pub const INVOICES_PER_PAGE: u64 = 20;

/// Sort direction for collection ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Customer collections can be ordered on any customer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerSortField {
    #[default]
    Id,
    FirstName,
    LastName,
    Email,
    Company,
}

/// Invoice collections can be ordered on amount or sentAt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceSortField {
    Amount,
    #[default]
    SentAt,
}

/// Filter and ordering for customer listings
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Partial match on first name
    pub first_name: Option<String>,
    /// Exact match on last name
    pub last_name: Option<String>,
    /// Exact match on company
    pub company: Option<String>,
    pub order_by: CustomerSortField,
    pub direction: SortDirection,
}

/// Ordering for invoice listings; defaults to `sentAt` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceOrder {
    pub order_by: InvoiceSortField,
    pub direction: SortDirection,
}

impl Default for InvoiceOrder {
    fn default() -> Self {
        Self {
            order_by: InvoiceSortField::SentAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Update the last seen timestamp
    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError>;
}

/// Repository for Customer entities
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError>;

    /// Customers of one owner, filtered and ordered
    async fn find_by_owner(
        &self,
        owner: &UserId,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, DomainError>;

    async fn create(&self, customer: &NewCustomer) -> Result<Customer, DomainError>;

    async fn update(
        &self,
        id: &CustomerId,
        changes: &CustomerChanges,
    ) -> Result<Customer, DomainError>;

    /// Delete the customer and its invoices inside one transaction, so no
    /// orphan invoice survives a customer removal.
    async fn delete_with_invoices(&self, id: &CustomerId) -> Result<(), DomainError>;
}

/// Repository for Invoice entities
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// All invoices of one customer (the sub-resource listing)
    async fn find_by_customer(
        &self,
        customer_id: &CustomerId,
        order: InvoiceOrder,
    ) -> Result<Vec<Invoice>, DomainError>;

    /// One page (1-based) of the owner's invoices across all of their
    /// customers, `INVOICES_PER_PAGE` per page.
    async fn find_page_by_owner(
        &self,
        owner: &UserId,
        order: InvoiceOrder,
        page: u64,
    ) -> Result<Vec<Invoice>, DomainError>;

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError>;

    async fn update(
        &self,
        id: &InvoiceId,
        changes: &InvoiceChanges,
    ) -> Result<Invoice, DomainError>;

    async fn delete(&self, id: &InvoiceId) -> Result<(), DomainError>;

    /// Atomically add 1 to the invoice's chrono and return the updated row.
    ///
    /// Implementations must apply the increment as a single storage-level
    /// operation. `DomainError::Unavailable` is reserved for failures raised
    /// before the statement could be sent, i.e. the increment is confirmed
    /// not applied and may be retried. Any other error leaves the applied
    /// state unknown (the statement may have committed before the failure)
    /// and must not trigger a blind retry.
    async fn increment_chrono(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;
}
