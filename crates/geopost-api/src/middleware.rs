use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tracing::warn;

use crate::auth::AppState;
use crate::error::ApiError;

/// Validate the bearer token before the handler runs and hand its [`Claims`]
/// to the handler as a request extension.
///
/// The request body is untouched until the token checks out.
///
/// [`Claims`]: geopost_types::api::Claims
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| ApiError::Unauthenticated)?;

    let claims = state.tokens.validate(bearer.token()).map_err(|e| {
        warn!("Rejected bearer token on {}: {}", req.uri().path(), e);
        ApiError::Unauthenticated
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
