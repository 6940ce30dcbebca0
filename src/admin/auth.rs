//! Bearer-key authorization for the admin surface.

use axum::http::header::AUTHORIZATION;

use crate::error::ApiError;
use crate::http::ApiRequest;
use crate::routing::{permission, PermissionCheck};

/// Checks `Authorization: Bearer <key>` against the configured admin key.
#[derive(Debug, Clone)]
pub struct BearerAuthorizer {
    api_key: String,
}

impl BearerAuthorizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Missing credentials are `Unauthorized`; a wrong key is a plain denial.
    pub fn authorize(&self, request: &ApiRequest) -> Result<bool, ApiError> {
        let token = request
            .header(AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ApiError::Unauthorized)?;

        Ok(token == self.api_key)
    }

    pub fn into_permission(self) -> PermissionCheck {
        permission(move |request: &ApiRequest| self.authorize(request))
    }
}
