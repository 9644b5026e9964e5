use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use mercato_core::Actor;
use mercato_shared::Slug;

/// Bearer token claims: `sub` carries the user slug.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Resolve the caller once: verify the token, look the user up, refuse
/// blocked accounts, and hand a typed `Actor` to every handler through the
/// request extensions. The directory record is authoritative for the role.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
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
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. The subject must still exist in the directory
    let slug = Slug::from_raw(token_data.claims.sub);
    let user = state
        .directory
        .find_by_slug(&slug)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 4. Blocked accounts are turned away at the door
    if user.is_blocked {
        return Err(StatusCode::FORBIDDEN);
    }

    // 5. Inject the typed actor
    req.extensions_mut().insert(Actor::new(slug, user.role));

    Ok(next.run(req).await)
}
