//! Request extractors that reject with [`ApiError`] bodies.

use crate::auth::bearer_token;
use crate::board::Board;
use crate::error::ApiError;
use crate::policy::Actor;
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

/// The authenticated caller. Missing, unknown or expired tokens are
/// rejected with `UNAUTHORIZED` before any handler logic runs.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub actor: Actor,
    pub token: String,
}

impl FromRequestParts<Board> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, board: &Board) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(ApiError::unauthorized)?
            .to_string();
        let actor = board.authenticate(&token)?;
        Ok(Self { actor, token })
    }
}

/// JSON body; malformed input is `INVALID_FIELD_VALUE`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid_value("body", rejection.body_text())),
        }
    }
}

/// Query string; malformed input is `INVALID_FIELD_VALUE`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid_value("query", rejection.body_text())),
        }
    }
}
