// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer: identity extraction, JSON bodies, routing.
// Every decision is delegated to the command handlers in `crate::domain`.
// Order mutation bodies are passed through raw so the role check sees
// them before any value is validated.
//
// ============================================================================

mod auth;
mod cart;
mod error;
mod orders;

use std::sync::Arc;

use actix_web::web;

use crate::domain::cart::CartCommandHandler;
use crate::domain::order::OrderCommandHandler;
use crate::metrics::Metrics;
use crate::store::Store;

/// Shared per-process state; everything else is per request.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub carts: CartCommandHandler,
    pub orders: OrderCommandHandler,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>) -> Self {
        Self {
            carts: CartCommandHandler::new(store.clone(), metrics.clone()),
            orders: OrderCommandHandler::new(store.clone(), metrics),
            store,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(error::json_error))
            .app_data(web::PathConfig::default().error_handler(error::path_error))
            .service(
                web::resource("/cart/menu-items")
                    .route(web::get().to(cart::list_cart))
                    .route(web::post().to(cart::add_to_cart))
                    .route(web::delete().to(cart::clear_cart)),
            )
            .service(
                web::resource("/orders")
                    .route(web::get().to(orders::list_orders))
                    .route(web::post().to(orders::checkout)),
            )
            .service(
                web::resource("/orders/{id}")
                    .route(web::get().to(orders::get_order))
                    .route(web::patch().to(orders::patch_order))
                    .route(web::put().to(orders::replace_order))
                    .route(web::delete().to(orders::delete_order)),
            ),
    );
}

// ============================================================================
// HTTP Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::domain::role::{DELIVERY_CREW_GROUP, MANAGER_GROUP};
    use crate::models::{MenuItem, User};
    use crate::store::MemoryStore;

    struct Seeded {
        store: MemoryStore,
        crew: User,
        salad: MenuItem,
        dessert: MenuItem,
    }

    async fn seed() -> Seeded {
        let store = MemoryStore::new();
        let crew = User::new("crew").with_group(DELIVERY_CREW_GROUP);
        store.add_user(&User::new("manager").with_group(MANAGER_GROUP), "manager").await;
        store.add_user(&crew, "crew").await;
        store.add_user(&User::new("customer"), "customer").await;
        store.add_user(&User::new("stranger"), "stranger").await;

        let salad = MenuItem {
            id: Uuid::new_v4(),
            title: "Greek Salad".to_string(),
            price: Decimal::new(1000, 2),
            category: Uuid::new_v4(),
            featured: true,
        };
        let dessert = MenuItem {
            id: Uuid::new_v4(),
            title: "Lemon Dessert".to_string(),
            price: Decimal::new(500, 2),
            category: Uuid::new_v4(),
            featured: false,
        };
        store.add_menu_item(&salad).await;
        store.add_menu_item(&dessert).await;

        Seeded { store, crew, salad, dessert }
    }

    macro_rules! app {
        ($store:expr) => {{
            let state = AppState::new(Arc::new($store.clone()), Arc::new(Metrics::new().unwrap()));
            test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await
        }};
    }

    fn auth(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Token {token}"))
    }

    #[actix_web::test]
    async fn test_requests_without_token_are_unauthenticated() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/cart/menu-items")
            .insert_header(auth("nope"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_cart_to_order_flow() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        for (item, quantity) in [(&seeded.salad, 2), (&seeded.dessert, 1)] {
            let req = test::TestRequest::post()
                .uri("/api/cart/menu-items")
                .insert_header(auth("customer"))
                .set_json(json!({"menuitem": item.id, "quantity": quantity}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(auth("customer"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let order: Value = test::read_body_json(resp).await;
        assert_eq!(order["total"], "25.00");
        assert_eq!(order["status"], "pending");
        assert_eq!(order["items"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/cart/menu-items")
            .insert_header(auth("customer"))
            .to_request();
        let cart: Value = test::call_and_read_body_json(&app, req).await;
        assert!(cart.as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/api/orders")
            .insert_header(auth("stranger"))
            .to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert!(orders.as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_empty_cart_checkout_is_bad_request() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(auth("customer"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_clear_cart_twice() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        for _ in 0..2 {
            let req = test::TestRequest::delete()
                .uri("/api/cart/menu-items")
                .insert_header(auth("customer"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }

    #[actix_web::test]
    async fn test_order_mutation_by_role() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::post()
            .uri("/api/cart/menu-items")
            .insert_header(auth("customer"))
            .set_json(json!({"menuitem": seeded.salad.id, "quantity": 1}))
            .to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(auth("customer"))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

        // Customer: forbidden with the literal message.
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(auth("customer"))
            .set_json(json!({"status": "delivered"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "You are not authorized to perform this action."}));

        // Manager: assign crew and status in one request.
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(auth("manager"))
            .set_json(json!({"status": "out_for_delivery", "delivery_crew": seeded.crew.id}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "out_for_delivery");
        assert_eq!(updated["delivery_crew"], json!(seeded.crew.id));

        // Delivery crew: reassigning is forbidden, status is allowed.
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(auth("crew"))
            .set_json(json!({"delivery_crew": null}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(auth("crew"))
            .set_json(json!({"status": "delivered"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "delivered");
        assert_eq!(updated["delivery_crew"], json!(seeded.crew.id));

        // Delete: crew forbidden, manager allowed.
        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(auth("crew"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(auth("manager"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(auth("manager"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    macro_rules! place_order {
        ($app:expr, $item:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/cart/menu-items")
                .insert_header(auth("customer"))
                .set_json(json!({"menuitem": $item, "quantity": 1}))
                .to_request();
            test::call_service(&$app, req).await;
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .insert_header(auth("customer"))
                .to_request();
            let order: Value = test::call_and_read_body_json(&$app, req).await;
            format!("/api/orders/{}", order["id"].as_str().unwrap())
        }};
    }

    #[actix_web::test]
    async fn test_forbidden_roles_get_403_whatever_the_body() {
        let seeded = seed().await;
        let app = app!(seeded.store);
        let uri = place_order!(app, seeded.salad.id);

        let cases = [
            (test::TestRequest::patch(), "customer", r#"{"status": "shipped"}"#),
            (test::TestRequest::put(), "customer", r#"{"delivery_crew": null}"#),
            (test::TestRequest::patch(), "customer", "{not json"),
            (test::TestRequest::patch(), "crew", r#"{"delivery_crew": "not-a-uuid"}"#),
            (test::TestRequest::put(), "crew", ""),
        ];
        for (builder, token, body) in cases {
            let req = builder
                .uri(&uri)
                .insert_header(auth(token))
                .insert_header(("Content-Type", "application/json"))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{token} {body}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"message": "You are not authorized to perform this action."}));
        }
    }

    #[actix_web::test]
    async fn test_manager_bad_body_is_bad_request() {
        let seeded = seed().await;
        let app = app!(seeded.store);
        let uri = place_order!(app, seeded.salad.id);

        for body in [r#"{"status": "shipped"}"#, "{not json"] {
            let req = test::TestRequest::patch()
                .uri(&uri)
                .insert_header(auth("manager"))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(auth("manager"))
            .set_json(json!({"delivery_crew": null}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_extractor_errors_use_message_body() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::post()
            .uri("/api/cart/menu-items")
            .insert_header(auth("customer"))
            .set_json(json!({"menuitem": "not-a-uuid", "quantity": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/orders/not-a-uuid")
            .insert_header(auth("manager"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn test_oversized_cart_line_is_bad_request() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::post()
            .uri("/api/cart/menu-items")
            .insert_header(auth("customer"))
            .set_json(json!({"menuitem": seeded.salad.id, "quantity": 2_000_000_000}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_foreign_order_is_not_found() {
        let seeded = seed().await;
        let app = app!(seeded.store);

        let req = test::TestRequest::post()
            .uri("/api/cart/menu-items")
            .insert_header(auth("customer"))
            .set_json(json!({"menuitem": seeded.dessert.id, "quantity": 3}))
            .to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(auth("customer"))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", order["id"].as_str().unwrap()))
            .insert_header(auth("stranger"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
