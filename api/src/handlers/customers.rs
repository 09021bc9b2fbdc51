//! Customer handlers
//!
//! Endpoints for customer management. The response structs are the explicit
//! serialization views: the customer view embeds the invoice list plus the
//! derived totals, and embedded invoices carry no back-references.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{CustomerDraft, CustomerWithInvoices};
use crate::domain::entities::{total_amount, unpaid_amount, CustomerId, Invoice, User};
use crate::domain::ports::{
    CustomerFilter, CustomerSortField, InvoiceOrder, InvoiceSortField, SortDirection,
};
use crate::error::AppError;
use crate::AppState;

/// Query parameters for listing customers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomersQuery {
    /// Partial match on first name
    pub first_name: Option<String>,
    /// Exact match on last name
    pub last_name: Option<String>,
    /// Exact match on company
    pub company: Option<String>,
    #[serde(default)]
    pub order_by: CustomerSortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl From<ListCustomersQuery> for CustomerFilter {
    fn from(query: ListCustomersQuery) -> Self {
        CustomerFilter {
            first_name: query.first_name,
            last_name: query.last_name,
            company: query.company,
            order_by: query.order_by,
            direction: query.direction,
        }
    }
}

/// Ordering for the invoice sub-resource listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubresourceOrderQuery {
    #[serde(default)]
    pub order_by: InvoiceSortField,
    #[serde(default = "default_desc")]
    pub direction: SortDirection,
}

fn default_desc() -> SortDirection {
    SortDirection::Desc
}

/// Request body for creating or updating a customer.
///
/// Every field is optional at the wire level; required-field checks are part
/// of validation so all violations come back together.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Owning user id; defaults to the authenticated user
    pub user: Option<Uuid>,
}

impl From<CustomerRequest> for CustomerDraft {
    fn from(request: CustomerRequest) -> Self {
        CustomerDraft {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            company: request.company,
            user: request.user,
        }
    }
}

/// Invoice embedded in the customer view (no back-references)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedInvoice {
    pub id: String,
    pub amount: Decimal,
    pub sent_at: String,
    pub status: String,
    pub chrono: i64,
}

impl From<&Invoice> for EmbeddedInvoice {
    fn from(invoice: &Invoice) -> Self {
        EmbeddedInvoice {
            id: invoice.id.to_string(),
            amount: invoice.amount,
            sent_at: invoice.sent_at.to_rfc3339(),
            status: invoice.status.to_string(),
            chrono: invoice.chrono,
        }
    }
}

/// The customer view: customer fields, derived totals, embedded invoices
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub user: String,
    pub total_amount: Decimal,
    pub unpaid_amount: Decimal,
    pub invoices: Vec<EmbeddedInvoice>,
    pub created_at: String,
}

impl CustomerResponse {
    pub fn from_parts(parts: CustomerWithInvoices) -> Self {
        let CustomerWithInvoices { customer, invoices } = parts;
        CustomerResponse {
            id: customer.id.to_string(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            company: customer.company,
            user: customer.user_id.to_string(),
            total_amount: total_amount(&invoices),
            unpaid_amount: unpaid_amount(&invoices),
            invoices: invoices.iter().map(EmbeddedInvoice::from).collect(),
            created_at: customer.created_at.to_rfc3339(),
        }
    }
}

/// GET /customers
///
/// List the authenticated user's customers, filtered and ordered.
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state
        .customer_service
        .list_with_invoices(&user, &query.into())
        .await?;

    Ok(Json(
        customers
            .into_iter()
            .map(CustomerResponse::from_parts)
            .collect(),
    ))
}

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state
        .customer_service
        .get(&user, &CustomerId(id))
        .await?;

    Ok(Json(CustomerResponse::from_parts(customer)))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state
        .customer_service
        .create(&user, request.into())
        .await?;

    Ok(Json(CustomerResponse::from_parts(CustomerWithInvoices {
        customer,
        invoices: Vec::new(),
    })))
}

/// PUT /customers/:id
///
/// Full replacement; every required field must be present.
pub async fn put_customer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = CustomerId(id);
    state
        .customer_service
        .replace(&user, &id, request.into())
        .await?;

    let customer = state.customer_service.get(&user, &id).await?;
    Ok(Json(CustomerResponse::from_parts(customer)))
}

/// PATCH /customers/:id
///
/// Partial update; absent fields are left unchanged.
pub async fn patch_customer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = CustomerId(id);
    state
        .customer_service
        .modify(&user, &id, request.into())
        .await?;

    let customer = state.customer_service.get(&user, &id).await?;
    Ok(Json(CustomerResponse::from_parts(customer)))
}

/// DELETE /customers/:id
///
/// Removes the customer and its invoices.
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .customer_service
        .delete(&user, &CustomerId(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /customers/:id/invoices
///
/// Sub-resource listing of a customer's invoices.
pub async fn list_customer_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(query): Query<SubresourceOrderQuery>,
) -> Result<Json<Vec<EmbeddedInvoice>>, AppError> {
    let order = InvoiceOrder {
        order_by: query.order_by,
        direction: query.direction,
    };
    let invoices = state
        .customer_service
        .invoices_of(&user, &CustomerId(id), order)
        .await?;

    Ok(Json(invoices.iter().map(EmbeddedInvoice::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_customer_request_camel_case() {
        let json = r#"{"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}"#;
        let request: CustomerRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.first_name.as_deref(), Some("Jane"));
        assert_eq!(request.last_name.as_deref(), Some("Doe"));
        assert!(request.company.is_none());
    }

    #[test]
    fn parse_customer_request_tolerates_missing_fields() {
        let json = r#"{}"#;
        let request: CustomerRequest = serde_json::from_str(json).unwrap();
        assert!(request.first_name.is_none());
        assert!(request.email.is_none());
    }

    #[test]
    fn parse_list_query_defaults() {
        let query: ListCustomersQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(query.order_by, CustomerSortField::Id);
        assert_eq!(query.direction, SortDirection::Asc);
    }

    #[test]
    fn parse_list_query_order_fields() {
        let query: ListCustomersQuery =
            serde_json::from_str(r#"{"orderBy": "firstName", "direction": "desc"}"#).unwrap();
        assert_eq!(query.order_by, CustomerSortField::FirstName);
        assert_eq!(query.direction, SortDirection::Desc);
    }
}
