use crate::{error::AppError, AppState};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName},
};
use core_types::UserId;
use std::sync::Arc;

/// The user a request acts for, taken from the identity header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

pub fn parse_identity(headers: &HeaderMap, header: &HeaderName) -> Result<UserId, AppError> {
    let raw = headers
        .get(header)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {header} header")))?;

    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<UserId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Unauthorized(format!("invalid {header} header")))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parse_identity(&parts.headers, &state.identity_header).map(CurrentUser)
    }
}
