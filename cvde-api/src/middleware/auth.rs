use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cvde_core::identity::UserRole;

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the identity provider. `sub` is the profile id and `role`
/// is one of the portal roles.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PortalClaims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

fn decode_claims(req: &Request, secret: &str) -> Result<PortalClaims, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<PortalClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}

// ============================================================================
// Vet Authentication Middleware
// ============================================================================

pub async fn vet_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_claims(&req, &state.auth.secret)?;

    // Vet endpoints are scoped to the vet's own data, so admins stay out.
    if !matches!(claims.role.parse::<UserRole>(), Ok(UserRole::VetUser)) {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_claims(&req, &state.auth.secret)?;

    if !matches!(claims.role.parse::<UserRole>(), Ok(UserRole::AdminUser)) {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
