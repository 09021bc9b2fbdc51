//! Invoice handlers
//!
//! Endpoints for invoice management, including the chrono increment action.
//! The invoice view carries a customer summary and the derived `user` (the
//! customer's owner) rather than storing the owner on the invoice.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{InvoiceDraft, InvoiceWithCustomer};
use crate::domain::entities::{Customer, InvoiceId, User};
use crate::domain::ports::{InvoiceOrder, InvoiceSortField, SortDirection};
use crate::error::AppError;
use crate::AppState;

/// Query parameters for the paginated invoice listing; defaults to page 1
/// ordered by `sentAt` descending.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub order_by: InvoiceSortField,
    #[serde(default = "default_desc")]
    pub direction: SortDirection,
}

fn default_page() -> u64 {
    1
}

fn default_desc() -> SortDirection {
    SortDirection::Desc
}

impl ListInvoicesQuery {
    fn order(&self) -> InvoiceOrder {
        InvoiceOrder {
            order_by: self.order_by,
            direction: self.direction,
        }
    }
}

/// Request body for creating or updating an invoice.
///
/// Fields arrive loosely typed (status as free text, sentAt as a string) and
/// are validated imperatively so all violations come back together.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub amount: Option<Decimal>,
    pub sent_at: Option<String>,
    pub status: Option<String>,
    pub chrono: Option<i64>,
    /// Customer id the invoice belongs to
    pub customer: Option<Uuid>,
}

impl From<InvoiceRequest> for InvoiceDraft {
    fn from(request: InvoiceRequest) -> Self {
        InvoiceDraft {
            amount: request.amount,
            sent_at: request.sent_at,
            status: request.status,
            chrono: request.chrono,
            customer: request.customer,
        }
    }
}

/// Customer fields embedded in the invoice view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        CustomerSummary {
            id: customer.id.to_string(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            company: customer.company.clone(),
        }
    }
}

/// The invoice view: invoice fields, customer summary, derived owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub amount: Decimal,
    pub sent_at: String,
    pub status: String,
    pub chrono: i64,
    pub customer: CustomerSummary,
    /// The invoice's effective owner: its customer's user
    pub user: String,
}

impl InvoiceResponse {
    pub fn from_parts(parts: InvoiceWithCustomer) -> Self {
        let InvoiceWithCustomer { invoice, customer } = parts;
        InvoiceResponse {
            id: invoice.id.to_string(),
            amount: invoice.amount,
            sent_at: invoice.sent_at.to_rfc3339(),
            status: invoice.status.to_string(),
            chrono: invoice.chrono,
            user: customer.user_id.to_string(),
            customer: CustomerSummary::from(&customer),
        }
    }
}

/// GET /invoices
///
/// One page (20 items) of the authenticated user's invoices.
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state
        .invoice_service
        .list(&user, query.order(), query.page)
        .await?;

    Ok(Json(
        invoices
            .into_iter()
            .map(InvoiceResponse::from_parts)
            .collect(),
    ))
}

/// GET /invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoice_service.get(&user, &InvoiceId(id)).await?;
    Ok(Json(InvoiceResponse::from_parts(invoice)))
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoice_service.create(&user, request.into()).await?;
    Ok(Json(InvoiceResponse::from_parts(invoice)))
}

/// PUT /invoices/:id
///
/// Full replacement; every required field must be present.
pub async fn put_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .replace(&user, &InvoiceId(id), request.into())
        .await?;

    Ok(Json(InvoiceResponse::from_parts(invoice)))
}

/// PATCH /invoices/:id
///
/// Partial update; absent fields are left unchanged.
pub async fn patch_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .modify(&user, &InvoiceId(id), request.into())
        .await?;

    Ok(Json(InvoiceResponse::from_parts(invoice)))
}

/// DELETE /invoices/:id
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.invoice_service.delete(&user, &InvoiceId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /invoices/:id/increment
///
/// Atomically increments the invoice's chrono and returns the updated
/// invoice representation.
pub async fn increment_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .increment_chrono(&user, &InvoiceId(id))
        .await?;

    Ok(Json(InvoiceResponse::from_parts(invoice)))
}
