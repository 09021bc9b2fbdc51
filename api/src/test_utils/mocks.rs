//! Mock implementations of port traits
//!
//! In-memory implementations that store data behind RwLocks. The customer
//! and invoice mocks share one store so owner scoping (a join through
//! customers) and the cascade delete observe the same state. The chrono
//! increment happens under the write lock, mirroring the atomicity the
//! Postgres adapter gets from its single UPDATE statement.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::domain::entities::{
    Customer, CustomerChanges, CustomerId, Invoice, InvoiceChanges, InvoiceId, NewCustomer,
    NewInvoice, NewUser, User, UserId,
};
use crate::domain::ports::{
    CustomerFilter, CustomerRepository, CustomerSortField, InvoiceOrder, InvoiceRepository,
    InvoiceSortField, SortDirection, UserRepository, INVOICES_PER_PAGE,
};
use crate::error::DomainError;

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.api_key_hash == hash).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let user = User {
            id: UserId::new(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            email: new_user.email.clone(),
            api_key_hash: new_user.api_key_hash.clone(),
            created_at: Utc::now(),
            last_seen_at: None,
        };

        let mut users = self.users.write().unwrap();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(id) {
            Some(user) => {
                user.last_seen_at = Some(Utc::now());
                Ok(())
            }
            None => Err(DomainError::NotFound("user not found".to_string())),
        }
    }
}

// ============================================================================
// Shared customer/invoice store
// ============================================================================

/// Shared in-memory tables for the customer and invoice repositories.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
    /// Errors to raise from upcoming `increment_chrono` calls, in order.
    /// An injected error is raised before anything is applied, matching
    /// what the error classes promise about the real adapter.
    increment_errors: Arc<RwLock<Vec<DomainError>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `increment_chrono` call fail with `error` without
    /// applying the increment. Queued errors are consumed in order.
    pub fn fail_next_increment(&self, error: DomainError) {
        self.increment_errors.write().unwrap().push(error);
    }

    /// Pre-populate with a customer for testing
    pub fn with_customer(self, customer: Customer) -> Self {
        self.customers
            .write()
            .unwrap()
            .insert(customer.id, customer);
        self
    }

    /// Pre-populate with an invoice for testing
    pub fn with_invoice(self, invoice: Invoice) -> Self {
        self.invoices.write().unwrap().insert(invoice.id, invoice);
        self
    }

    pub fn customer_repo(&self) -> InMemoryCustomerRepository {
        InMemoryCustomerRepository {
            store: self.clone(),
        }
    }

    pub fn invoice_repo(&self) -> InMemoryInvoiceRepository {
        InMemoryInvoiceRepository {
            store: self.clone(),
        }
    }
}

// ============================================================================
// In-Memory Customer Repository
// ============================================================================

pub struct InMemoryCustomerRepository {
    store: InMemoryStore,
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        let customers = self.store.customers.read().unwrap();
        Ok(customers.get(id).cloned())
    }

    async fn find_by_owner(
        &self,
        owner: &UserId,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, DomainError> {
        let customers = self.store.customers.read().unwrap();

        let mut result: Vec<Customer> = customers
            .values()
            .filter(|c| c.user_id == *owner)
            .filter(|c| {
                filter
                    .first_name
                    .as_ref()
                    .map(|needle| c.first_name.contains(needle.as_str()))
                    .unwrap_or(true)
            })
            .filter(|c| {
                filter
                    .last_name
                    .as_ref()
                    .map(|exact| c.last_name == *exact)
                    .unwrap_or(true)
            })
            .filter(|c| {
                filter
                    .company
                    .as_ref()
                    .map(|exact| c.company.as_deref() == Some(exact.as_str()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            let ord = match filter.order_by {
                CustomerSortField::Id => a.id.0.cmp(&b.id.0),
                CustomerSortField::FirstName => a.first_name.cmp(&b.first_name),
                CustomerSortField::LastName => a.last_name.cmp(&b.last_name),
                CustomerSortField::Email => a.email.cmp(&b.email),
                CustomerSortField::Company => a.company.cmp(&b.company),
            };
            match filter.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        Ok(result)
    }

    async fn create(&self, customer: &NewCustomer) -> Result<Customer, DomainError> {
        let customer = Customer {
            id: CustomerId::new(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            company: customer.company.clone(),
            user_id: customer.user_id,
            created_at: Utc::now(),
        };

        let mut customers = self.store.customers.write().unwrap();
        customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update(
        &self,
        id: &CustomerId,
        changes: &CustomerChanges,
    ) -> Result<Customer, DomainError> {
        let mut customers = self.store.customers.write().unwrap();
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound("customer not found".to_string()))?;

        if let Some(first_name) = &changes.first_name {
            customer.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            customer.last_name = last_name.clone();
        }
        if let Some(email) = &changes.email {
            customer.email = email.clone();
        }
        if let Some(company) = &changes.company {
            customer.company = company.clone();
        }

        Ok(customer.clone())
    }

    async fn delete_with_invoices(&self, id: &CustomerId) -> Result<(), DomainError> {
        // one logical transaction: both tables change under their write locks
        let mut customers = self.store.customers.write().unwrap();
        let mut invoices = self.store.invoices.write().unwrap();

        customers.remove(id);
        invoices.retain(|_, invoice| invoice.customer_id != *id);

        Ok(())
    }
}

// ============================================================================
// In-Memory Invoice Repository
// ============================================================================

pub struct InMemoryInvoiceRepository {
    store: InMemoryStore,
}

fn sort_invoices(invoices: &mut [Invoice], order: InvoiceOrder) {
    invoices.sort_by(|a, b| {
        let ord = match order.order_by {
            InvoiceSortField::Amount => a.amount.cmp(&b.amount),
            InvoiceSortField::SentAt => a.sent_at.cmp(&b.sent_at),
        };
        match order.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let invoices = self.store.invoices.read().unwrap();
        Ok(invoices.get(id).cloned())
    }

    async fn find_by_customer(
        &self,
        customer_id: &CustomerId,
        order: InvoiceOrder,
    ) -> Result<Vec<Invoice>, DomainError> {
        let invoices = self.store.invoices.read().unwrap();

        let mut result: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| invoice.customer_id == *customer_id)
            .cloned()
            .collect();
        sort_invoices(&mut result, order);

        Ok(result)
    }

    async fn find_page_by_owner(
        &self,
        owner: &UserId,
        order: InvoiceOrder,
        page: u64,
    ) -> Result<Vec<Invoice>, DomainError> {
        let owned: HashSet<CustomerId> = {
            let customers = self.store.customers.read().unwrap();
            customers
                .values()
                .filter(|c| c.user_id == *owner)
                .map(|c| c.id)
                .collect()
        };

        let invoices = self.store.invoices.read().unwrap();
        let mut result: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| owned.contains(&invoice.customer_id))
            .cloned()
            .collect();
        sort_invoices(&mut result, order);

        let offset = (page.saturating_sub(1) * INVOICES_PER_PAGE) as usize;
        Ok(result
            .into_iter()
            .skip(offset)
            .take(INVOICES_PER_PAGE as usize)
            .collect())
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError> {
        let invoice = Invoice {
            id: InvoiceId::new(),
            amount: invoice.amount,
            sent_at: invoice.sent_at,
            status: invoice.status,
            chrono: invoice.chrono,
            customer_id: invoice.customer_id,
        };

        let mut invoices = self.store.invoices.write().unwrap();
        invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn update(
        &self,
        id: &InvoiceId,
        changes: &InvoiceChanges,
    ) -> Result<Invoice, DomainError> {
        let mut invoices = self.store.invoices.write().unwrap();
        let invoice = invoices
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound("invoice not found".to_string()))?;

        if let Some(amount) = changes.amount {
            invoice.amount = amount;
        }
        if let Some(sent_at) = changes.sent_at {
            invoice.sent_at = sent_at;
        }
        if let Some(status) = changes.status {
            invoice.status = status;
        }
        if let Some(chrono) = changes.chrono {
            invoice.chrono = chrono;
        }
        if let Some(customer_id) = changes.customer_id {
            invoice.customer_id = customer_id;
        }

        Ok(invoice.clone())
    }

    async fn delete(&self, id: &InvoiceId) -> Result<(), DomainError> {
        let mut invoices = self.store.invoices.write().unwrap();
        invoices.remove(id);
        Ok(())
    }

    async fn increment_chrono(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        {
            let mut errors = self.store.increment_errors.write().unwrap();
            if !errors.is_empty() {
                return Err(errors.remove(0));
            }
        }

        // read-modify-write entirely under the exclusive lock
        let mut invoices = self.store.invoices.write().unwrap();
        Ok(invoices.get_mut(id).map(|invoice| {
            invoice.chrono += 1;
            invoice.clone()
        }))
    }
}
