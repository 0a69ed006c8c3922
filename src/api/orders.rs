use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::domain::order::{OrderCommand, OrderOutcome, OrderPatch, OrderReplace};
use super::auth::CurrentUser;
use super::error::ApiError;
use super::AppState;

pub async fn list_orders(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let orders = state.orders.list(&user).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn checkout(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let detail = state.orders.checkout(&user).await?;
    Ok(HttpResponse::Created().json(detail))
}

pub async fn get_order(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let detail = state.orders.get(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn patch_order(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let command = OrderCommand::Patch(OrderPatch::from_slice(&body));
    respond(state.orders.handle(&user, path.into_inner(), command).await?)
}

pub async fn replace_order(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let command = OrderCommand::Replace(OrderReplace::from_slice(&body));
    respond(state.orders.handle(&user, path.into_inner(), command).await?)
}

pub async fn delete_order(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    respond(state.orders.handle(&user, path.into_inner(), OrderCommand::Delete).await?)
}

fn respond(outcome: OrderOutcome) -> Result<HttpResponse, ApiError> {
    Ok(match outcome {
        OrderOutcome::Updated(order) => HttpResponse::Ok().json(order),
        OrderOutcome::Deleted => HttpResponse::NoContent().finish(),
    })
}
