//! Bearer-token extractors. Sessions are issued by the identity service; this
//! crate only resolves a token to the user it belongs to.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;

use crate::db::catalog;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::state::AppState;

/// Any authenticated, active user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// An authenticated user with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or("");
    if token.is_empty() {
        return Err(AppError::Unauthenticated(
            "expected 'Bearer <token>' authorization".into(),
        ));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let user = {
            let conn = state.conn()?;
            catalog::find_session_user(&conn, token, Utc::now().naive_utc())?
        };

        user.map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated("invalid or expired session".into()))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            tracing::warn!(user_id = %user.id, "non-admin attempted admin access");
            return Err(AppError::Unauthorized("admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
