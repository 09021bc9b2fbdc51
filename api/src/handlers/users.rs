//! User handlers
//!
//! Endpoints for registration and the user view.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::UserDraft;
use crate::domain::entities::User;
use crate::domain::ports::CustomerFilter;
use crate::error::AppError;
use crate::AppState;

use super::customers::CustomerResponse;

/// Request body for user registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<RegisterRequest> for UserDraft {
    fn from(request: RegisterRequest) -> Self {
        UserDraft {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
        }
    }
}

/// Response body for user registration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// API key for API calls (Authorization: Bearer <api_key>); only shown once
    pub api_key: String,
    pub message: String,
}

/// The user view: user fields plus nested customers and their invoices
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
    pub customers: Vec<CustomerResponse>,
}

/// POST /users
///
/// Register a new user. Returns credentials (only shown once).
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let (user, api_key) = state.user_service.register(request.into()).await?;

    let message = format!(
        "Welcome to Facturio! Save this API key - it won't be shown again.\n\n\
         API usage:\n\
           curl -H \"Authorization: Bearer {}\" {}/customers",
        api_key, state.config.api_base_url,
    );

    Ok(Json(RegisterResponse {
        id: user.id.to_string(),
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        api_key,
        message,
    }))
}

/// GET /users/:id
///
/// The user view, restricted to the authenticated user.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    if user.id.0 != id {
        return Err(AppError::Forbidden);
    }

    let customers = state
        .customer_service
        .list_with_invoices(&user, &CustomerFilter::default())
        .await?;

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
        customers: customers
            .into_iter()
            .map(CustomerResponse::from_parts)
            .collect(),
    }))
}
