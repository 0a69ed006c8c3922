// Private module declaration
mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Checkout outcomes and latency
// - Cart additions
// - Order mutations by action and outcome
// - Authorization denials by role
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Checkout Metrics
    pub checkouts_total: IntCounterVec,
    pub checkout_duration: Histogram,

    // Cart Metrics
    pub cart_lines_added: IntCounter,

    // Order Mutation Metrics
    pub order_mutations_total: IntCounterVec,
    pub authorization_denials_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("checkouts_total", "Checkout attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new("checkout_duration_seconds", "Checkout transaction duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let cart_lines_added = IntCounter::new(
            "cart_lines_added_total",
            "Total lines added to carts",
        )?;
        registry.register(Box::new(cart_lines_added.clone()))?;

        let order_mutations_total = IntCounterVec::new(
            Opts::new("order_mutations_total", "Order mutations by action and outcome"),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(order_mutations_total.clone()))?;

        let authorization_denials_total = IntCounterVec::new(
            Opts::new("authorization_denials_total", "Order mutations refused by policy"),
            &["role", "action"],
        )?;
        registry.register(Box::new(authorization_denials_total.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            cart_lines_added,
            order_mutations_total,
            authorization_denials_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a checkout attempt
    pub fn record_checkout(&self, outcome: &str, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[outcome]).inc();
        self.checkout_duration.observe(duration_secs);
    }

    pub fn record_cart_line_added(&self) {
        self.cart_lines_added.inc();
    }

    pub fn record_order_mutation(&self, action: &str, outcome: &str) {
        self.order_mutations_total.with_label_values(&[action, outcome]).inc();
    }

    pub fn record_authorization_denial(&self, role: &str, action: &str) {
        self.authorization_denials_total.with_label_values(&[role, action]).inc();
    }
}
