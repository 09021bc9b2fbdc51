//! Bearer API-key authentication
//!
//! Every resource route is scoped to an account owner: customers belong to
//! a user, and invoices to a customer's user. This middleware turns the
//! Authorization header into that owner before any handler runs, so the
//! services can take the `User` as a trusted input.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::AppState;

/// Require a valid `Authorization: Bearer sk-...` key and inject the owning
/// `User` into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .user_service
        .authenticate(api_key)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // last_seen is best-effort bookkeeping; don't hold the request for it
    let user_id = user.id;
    let user_service = state.user_service.clone();
    tokio::spawn(async move {
        if let Err(e) = user_service.touch(&user_id).await {
            tracing::warn!(error = %e, user_id = %user_id.0, "failed to record last_seen");
        }
    });

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
