use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::ApiError;

/// Контекст сессии пользователя. Создаётся из заголовка запроса и передаётся
/// явно во все вызовы бэкенда, которым нужна авторизация.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub bearer_token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Разбирает значение заголовка Authorization. Допускается только `Bearer <token>`.
    pub fn from_authorization(value: Option<&str>) -> Result<Self, ApiError> {
        let Some(value) = value else {
            return Ok(Self::anonymous());
        };

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized("Authorization header must be 'Bearer <token>'"))?;

        Ok(Self::with_token(token))
    }
}

// Bearer extractor: без заголовка - анонимная сессия, кривой заголовок - 401
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::Unauthorized("Authorization header is not valid text"))?,
            ),
            None => None,
        };

        Self::from_authorization(header)
    }
}
