use actix_web::{web, HttpResponse};

use crate::domain::cart::AddToCart;
use super::auth::CurrentUser;
use super::error::ApiError;
use super::AppState;

pub async fn list_cart(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let lines = state.carts.list(&user).await?;
    Ok(HttpResponse::Ok().json(lines))
}

pub async fn add_to_cart(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    body: web::Json<AddToCart>,
) -> Result<HttpResponse, ApiError> {
    let line = state.carts.add(&user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(line))
}

pub async fn clear_cart(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let deleted = state.carts.clear(&user).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": deleted })))
}
