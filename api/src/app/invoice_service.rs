//! Invoice service
//!
//! CRUD, the paginated owner listing, the sub-resource listing and the
//! chrono increment. The increment delegates to the repository's atomic
//! primitive; because incrementing is not idempotent, only failures that
//! provably occurred before the statement was sent are retried. Any other
//! failure leaves the applied state unknown and is surfaced without
//! re-issuing the statement.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::{
    Customer, CustomerId, Invoice, InvoiceChanges, InvoiceId, NewInvoice, User,
};
use crate::domain::ports::{CustomerRepository, InvoiceOrder, InvoiceRepository};
use crate::domain::validation;
use crate::error::{AppError, DomainError, Violations};

/// Storage retry budget for the chrono increment.
pub const CHRONO_RETRY_BUDGET: u32 = 3;

/// Raw invoice payload as received on the wire. Amount, status and sentAt
/// arrive loosely typed and are validated imperatively; required fields are
/// reported as violations rather than deserialization failures.
#[derive(Debug, Clone, Default)]
pub struct InvoiceDraft {
    pub amount: Option<Decimal>,
    pub sent_at: Option<String>,
    pub status: Option<String>,
    pub chrono: Option<i64>,
    pub customer: Option<Uuid>,
}

/// An invoice joined with its customer. The invoice's effective owner is the
/// customer's user, which the views derive from here.
#[derive(Debug, Clone)]
pub struct InvoiceWithCustomer {
    pub invoice: Invoice,
    pub customer: Customer,
}

/// Service for managing invoices
pub struct InvoiceService<IR, CR>
where
    IR: InvoiceRepository,
    CR: CustomerRepository,
{
    invoices: Arc<IR>,
    customers: Arc<CR>,
}

impl<IR, CR> InvoiceService<IR, CR>
where
    IR: InvoiceRepository,
    CR: CustomerRepository,
{
    pub fn new(invoices: Arc<IR>, customers: Arc<CR>) -> Self {
        Self { invoices, customers }
    }

    pub async fn create(
        &self,
        owner: &User,
        draft: InvoiceDraft,
    ) -> Result<InvoiceWithCustomer, AppError> {
        let mut violations = Violations::new();

        let amount = match draft.amount {
            Some(amount) => {
                validation::check_amount(&mut violations, amount);
                Some(amount)
            }
            None => {
                violations.push("amount", "amount is required");
                None
            }
        };
        let sent_at = match &draft.sent_at {
            Some(raw) => validation::parse_sent_at(&mut violations, raw),
            None => {
                violations.push("sentAt", "sentAt is required");
                None
            }
        };
        let status = match &draft.status {
            Some(raw) => validation::parse_status(&mut violations, raw),
            None => {
                violations.push("status", "status is required");
                None
            }
        };
        let chrono = match draft.chrono {
            Some(chrono) => {
                validation::check_chrono(&mut violations, chrono);
                Some(chrono)
            }
            None => {
                violations.push("chrono", "chrono is required");
                None
            }
        };
        let customer = match draft.customer {
            Some(raw) => self.resolve_customer(owner, raw, &mut violations).await?,
            None => {
                violations.push("customer", "an invoice must be linked to a customer");
                None
            }
        };

        violations.into_result()?;

        let (Some(amount), Some(sent_at), Some(status), Some(chrono), Some(customer)) =
            (amount, sent_at, status, chrono, customer)
        else {
            return Err(AppError::Internal(
                "validated invoice draft was incomplete".to_string(),
            ));
        };

        let invoice = self
            .invoices
            .create(&NewInvoice {
                amount,
                sent_at,
                status,
                chrono,
                customer_id: customer.id,
            })
            .await?;

        Ok(InvoiceWithCustomer { invoice, customer })
    }

    /// One page of the owner's invoices, each joined with its customer.
    pub async fn list(
        &self,
        owner: &User,
        order: InvoiceOrder,
        page: u64,
    ) -> Result<Vec<InvoiceWithCustomer>, AppError> {
        let invoices = self
            .invoices
            .find_page_by_owner(&owner.id, order, page)
            .await?;

        let mut cache: HashMap<CustomerId, Customer> = HashMap::new();
        let mut result = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            let customer = match cache.get(&invoice.customer_id) {
                Some(customer) => customer.clone(),
                None => {
                    let customer = self
                        .customers
                        .find_by_id(&invoice.customer_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::Internal(format!(
                                "invoice {} references missing customer {}",
                                invoice.id, invoice.customer_id
                            ))
                        })?;
                    cache.insert(invoice.customer_id, customer.clone());
                    customer
                }
            };
            result.push(InvoiceWithCustomer { invoice, customer });
        }

        Ok(result)
    }

    pub async fn get(&self, owner: &User, id: &InvoiceId) -> Result<InvoiceWithCustomer, AppError> {
        self.find_owned(owner, id).await
    }

    /// Full replacement (PUT): every required field must be present.
    pub async fn replace(
        &self,
        owner: &User,
        id: &InvoiceId,
        draft: InvoiceDraft,
    ) -> Result<InvoiceWithCustomer, AppError> {
        self.apply_update(owner, id, draft, true).await
    }

    /// Partial update (PATCH): absent fields are left unchanged.
    pub async fn modify(
        &self,
        owner: &User,
        id: &InvoiceId,
        draft: InvoiceDraft,
    ) -> Result<InvoiceWithCustomer, AppError> {
        self.apply_update(owner, id, draft, false).await
    }

    pub async fn delete(&self, owner: &User, id: &InvoiceId) -> Result<(), AppError> {
        self.find_owned(owner, id).await?;
        Ok(self.invoices.delete(id).await?)
    }

    /// Atomically increment the invoice's chrono and return the updated
    /// invoice.
    ///
    /// Incrementing is not idempotent, so a failed attempt is retried only
    /// when the repository confirms the statement was never applied
    /// (`DomainError::Unavailable`), up to `CHRONO_RETRY_BUDGET` times,
    /// then surfaced as Conflict. Any other failure may follow a committed
    /// statement; it propagates unchanged and the caller must re-read the
    /// chrono before deciding to retry.
    pub async fn increment_chrono(
        &self,
        owner: &User,
        id: &InvoiceId,
    ) -> Result<InvoiceWithCustomer, AppError> {
        let InvoiceWithCustomer { customer, .. } = self.find_owned(owner, id).await?;

        let mut last_error = String::new();
        for attempt in 1..=CHRONO_RETRY_BUDGET {
            match self.invoices.increment_chrono(id).await {
                Ok(Some(invoice)) => return Ok(InvoiceWithCustomer { invoice, customer }),
                Ok(None) => {
                    return Err(AppError::NotFound(format!("Invoice {} not found", id)));
                }
                // confirmed not applied: the statement never reached storage
                Err(DomainError::Unavailable(message)) => {
                    tracing::warn!(
                        attempt,
                        invoice_id = %id,
                        error = %message,
                        "chrono increment was not applied, retrying"
                    );
                    last_error = message;
                }
                // applied state unknown: re-issuing could double-increment
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Domain(DomainError::Conflict(format!(
            "chrono increment for invoice {} could not be applied after {} attempts: {}",
            id, CHRONO_RETRY_BUDGET, last_error
        ))))
    }

    async fn apply_update(
        &self,
        owner: &User,
        id: &InvoiceId,
        draft: InvoiceDraft,
        require_all: bool,
    ) -> Result<InvoiceWithCustomer, AppError> {
        self.find_owned(owner, id).await?;

        let mut violations = Violations::new();

        let amount = match draft.amount {
            Some(amount) => {
                validation::check_amount(&mut violations, amount);
                Some(amount)
            }
            None => {
                if require_all {
                    violations.push("amount", "amount is required");
                }
                None
            }
        };
        let sent_at = match &draft.sent_at {
            Some(raw) => validation::parse_sent_at(&mut violations, raw),
            None => {
                if require_all {
                    violations.push("sentAt", "sentAt is required");
                }
                None
            }
        };
        let status = match &draft.status {
            Some(raw) => validation::parse_status(&mut violations, raw),
            None => {
                if require_all {
                    violations.push("status", "status is required");
                }
                None
            }
        };
        let chrono = match draft.chrono {
            Some(chrono) => {
                validation::check_chrono(&mut violations, chrono);
                Some(chrono)
            }
            None => {
                if require_all {
                    violations.push("chrono", "chrono is required");
                }
                None
            }
        };
        let customer_id = match draft.customer {
            Some(raw) => self
                .resolve_customer(owner, raw, &mut violations)
                .await?
                .map(|customer| customer.id),
            None => {
                if require_all {
                    violations.push("customer", "an invoice must be linked to a customer");
                }
                None
            }
        };

        violations.into_result()?;

        let changes = InvoiceChanges {
            amount,
            sent_at,
            status,
            chrono,
            customer_id,
        };
        let invoice = self.invoices.update(id, &changes).await?;

        let customer = self
            .customers
            .find_by_id(&invoice.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "invoice {} references missing customer {}",
                    invoice.id, invoice.customer_id
                ))
            })?;

        Ok(InvoiceWithCustomer { invoice, customer })
    }

    /// Fetch an invoice with its customer and enforce transitive ownership:
    /// the invoice's owner is its customer's user. Foreign invoices read as
    /// absent.
    async fn find_owned(
        &self,
        owner: &User,
        id: &InvoiceId,
    ) -> Result<InvoiceWithCustomer, AppError> {
        let invoice = self
            .invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

        let customer = self
            .customers
            .find_by_id(&invoice.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "invoice {} references missing customer {}",
                    invoice.id, invoice.customer_id
                ))
            })?;

        if customer.user_id != owner.id {
            return Err(AppError::NotFound(format!("Invoice {} not found", id)));
        }

        Ok(InvoiceWithCustomer { invoice, customer })
    }

    /// Resolve a customer reference from a payload. A missing customer, or
    /// one owned by someone else, is a field violation, so foreign
    /// customers are not revealed.
    async fn resolve_customer(
        &self,
        owner: &User,
        raw: Uuid,
        violations: &mut Violations,
    ) -> Result<Option<Customer>, AppError> {
        let id = CustomerId(raw);
        match self.customers.find_by_id(&id).await? {
            Some(customer) if customer.user_id == owner.id => Ok(Some(customer)),
            _ => {
                violations.push("customer", "customer does not exist");
                Ok(None)
            }
        }
    }
}
