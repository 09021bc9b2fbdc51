//! Customer service
//!
//! CRUD with imperative validation, owner scoping and the on-demand
//! aggregate assembly. Deleting a customer removes its invoices in the same
//! transaction, so the customer/invoice relation stays consistent in both
//! directions.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::{
    Customer, CustomerChanges, CustomerId, Invoice, NewCustomer, User, UserId,
};
use crate::domain::ports::{
    CustomerFilter, CustomerRepository, InvoiceOrder, InvoiceRepository, UserRepository,
};
use crate::domain::validation;
use crate::error::{AppError, DomainError, Violations};

/// Raw customer payload as received on the wire. Required fields arrive as
/// `Option` so missing values are reported as violations together with the
/// field-level rules instead of failing at deserialization.
#[derive(Debug, Clone, Default)]
pub struct CustomerDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Explicit owner reference; must name an existing user
    pub user: Option<Uuid>,
}

/// A customer together with its current invoice set.
///
/// Totals are derived from `invoices` at view time, never stored.
#[derive(Debug, Clone)]
pub struct CustomerWithInvoices {
    pub customer: Customer,
    pub invoices: Vec<Invoice>,
}

/// Service for managing customers
pub struct CustomerService<CR, IR, UR>
where
    CR: CustomerRepository,
    IR: InvoiceRepository,
    UR: UserRepository,
{
    customers: Arc<CR>,
    invoices: Arc<IR>,
    users: Arc<UR>,
}

impl<CR, IR, UR> CustomerService<CR, IR, UR>
where
    CR: CustomerRepository,
    IR: InvoiceRepository,
    UR: UserRepository,
{
    pub fn new(customers: Arc<CR>, invoices: Arc<IR>, users: Arc<UR>) -> Self {
        Self {
            customers,
            invoices,
            users,
        }
    }

    pub async fn create(&self, owner: &User, draft: CustomerDraft) -> Result<Customer, AppError> {
        let mut violations = Violations::new();

        match &draft.first_name {
            Some(first_name) => validation::check_name(&mut violations, "firstName", first_name),
            None => violations.push("firstName", "first name is required"),
        }
        match &draft.last_name {
            Some(last_name) => validation::check_name(&mut violations, "lastName", last_name),
            None => violations.push("lastName", "last name is required"),
        }
        match &draft.email {
            Some(email) => validation::check_email(&mut violations, "email", email),
            None => violations.push("email", "email is required"),
        }

        let user_id = self
            .resolve_owner(owner, draft.user, &mut violations)
            .await?;

        violations.into_result()?;

        let (Some(first_name), Some(last_name), Some(email)) =
            (draft.first_name, draft.last_name, draft.email)
        else {
            return Err(AppError::Internal(
                "validated customer draft was incomplete".to_string(),
            ));
        };

        let customer = self
            .customers
            .create(&NewCustomer {
                first_name,
                last_name,
                email,
                company: draft.company,
                user_id: user_id.unwrap_or(owner.id),
            })
            .await?;

        Ok(customer)
    }

    pub async fn list(
        &self,
        owner: &User,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, AppError> {
        Ok(self.customers.find_by_owner(&owner.id, filter).await?)
    }

    /// Customers of the owner, each with its invoice set (the customer view
    /// embeds invoices and the derived totals).
    pub async fn list_with_invoices(
        &self,
        owner: &User,
        filter: &CustomerFilter,
    ) -> Result<Vec<CustomerWithInvoices>, AppError> {
        let customers = self.list(owner, filter).await?;

        let mut result = Vec::with_capacity(customers.len());
        for customer in customers {
            let invoices = self
                .invoices
                .find_by_customer(&customer.id, InvoiceOrder::default())
                .await?;
            result.push(CustomerWithInvoices { customer, invoices });
        }

        Ok(result)
    }

    pub async fn get(
        &self,
        owner: &User,
        id: &CustomerId,
    ) -> Result<CustomerWithInvoices, AppError> {
        let customer = self.find_owned(owner, id).await?;
        let invoices = self
            .invoices
            .find_by_customer(&customer.id, InvoiceOrder::default())
            .await?;

        Ok(CustomerWithInvoices { customer, invoices })
    }

    /// Full replacement (PUT): every required field must be present.
    pub async fn replace(
        &self,
        owner: &User,
        id: &CustomerId,
        draft: CustomerDraft,
    ) -> Result<Customer, AppError> {
        self.find_owned(owner, id).await?;

        let mut violations = Violations::new();
        match &draft.first_name {
            Some(first_name) => validation::check_name(&mut violations, "firstName", first_name),
            None => violations.push("firstName", "first name is required"),
        }
        match &draft.last_name {
            Some(last_name) => validation::check_name(&mut violations, "lastName", last_name),
            None => violations.push("lastName", "last name is required"),
        }
        match &draft.email {
            Some(email) => validation::check_email(&mut violations, "email", email),
            None => violations.push("email", "email is required"),
        }
        self.resolve_owner(owner, draft.user, &mut violations)
            .await?;
        violations.into_result()?;

        let changes = CustomerChanges {
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            // full replace: an absent company clears it
            company: Some(draft.company),
        };

        Ok(self.customers.update(id, &changes).await?)
    }

    /// Partial update (PATCH): absent fields are left unchanged.
    pub async fn modify(
        &self,
        owner: &User,
        id: &CustomerId,
        draft: CustomerDraft,
    ) -> Result<Customer, AppError> {
        self.find_owned(owner, id).await?;

        let mut violations = Violations::new();
        if let Some(first_name) = &draft.first_name {
            validation::check_name(&mut violations, "firstName", first_name);
        }
        if let Some(last_name) = &draft.last_name {
            validation::check_name(&mut violations, "lastName", last_name);
        }
        if let Some(email) = &draft.email {
            validation::check_email(&mut violations, "email", email);
        }
        self.resolve_owner(owner, draft.user, &mut violations)
            .await?;
        violations.into_result()?;

        let changes = CustomerChanges {
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            company: draft.company.map(Some),
        };

        Ok(self.customers.update(id, &changes).await?)
    }

    pub async fn delete(&self, owner: &User, id: &CustomerId) -> Result<(), AppError> {
        self.find_owned(owner, id).await?;
        Ok(self.customers.delete_with_invoices(id).await?)
    }

    /// Sub-resource listing of a customer's invoices
    pub async fn invoices_of(
        &self,
        owner: &User,
        id: &CustomerId,
        order: InvoiceOrder,
    ) -> Result<Vec<Invoice>, AppError> {
        let customer = self.find_owned(owner, id).await?;
        Ok(self.invoices.find_by_customer(&customer.id, order).await?)
    }

    /// Fetch a customer and enforce owner scoping. A customer of another
    /// user reads as absent, not forbidden.
    async fn find_owned(&self, owner: &User, id: &CustomerId) -> Result<Customer, AppError> {
        let customer = self
            .customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))?;

        if customer.user_id != owner.id {
            return Err(AppError::NotFound(format!("Customer {} not found", id)));
        }

        Ok(customer)
    }

    /// Resolve an explicit `user` reference. It must name an existing user
    /// (violation otherwise) and may only name the caller.
    async fn resolve_owner(
        &self,
        owner: &User,
        user: Option<Uuid>,
        violations: &mut Violations,
    ) -> Result<Option<UserId>, AppError> {
        let Some(raw) = user else {
            return Ok(None);
        };

        let id = UserId(raw);
        match self.users.find_by_id(&id).await? {
            Some(referenced) if referenced.id == owner.id => Ok(Some(referenced.id)),
            Some(_) => Err(AppError::Domain(DomainError::Forbidden(
                "customers can only be assigned to the authenticated user".to_string(),
            ))),
            None => {
                violations.push("user", "user does not exist");
                Ok(None)
            }
        }
    }
}
