use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::models::User;
use super::error::ApiError;
use super::AppState;

/// The authenticated requester, resolved from `Authorization: Token <key>`
/// (or `Bearer <key>`). Handlers taking this never run without an identity.
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = token_from(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("application state not configured"))
            })?;
            let token = token.ok_or(ApiError::NotAuthenticated)?;

            match state.store.user_by_token(&token).await {
                Ok(Some(user)) => Ok(CurrentUser(user)),
                Ok(None) => {
                    tracing::debug!("Rejected unknown token");
                    Err(ApiError::NotAuthenticated)
                }
                Err(e) => Err(ApiError::Internal(e)),
            }
        })
    }
}

fn token_from(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() || !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")) {
        return None;
    }
    Some(token.to_string())
}
