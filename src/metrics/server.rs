use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

/// Mount `/metrics` and `/health`.
/// Expects `web::Data<Arc<Registry>>` in the app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(registry: web::Data<Arc<Registry>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "little-lemon"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_metrics_endpoint_exposes_registry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_checkout("success", 0.01);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(metrics.registry().clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("checkouts_total"));
    }

    #[actix_web::test]
    async fn test_health_endpoint() {
        let app = test::init_service(App::new().configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
    }
}
