use uuid::Uuid;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("You are not authorized to perform this action.")]
    NotAuthorized,

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Cannot place an order from an empty cart")]
    EmptyCart,

    #[error("{0}")]
    InvalidBody(String),

    #[error("Order total {0} exceeds the maximum amount")]
    TotalTooLarge(rust_decimal::Decimal),

    #[error("User {0} is not a member of the delivery crew")]
    NotDeliveryCrew(Uuid),

    #[error("Checkout failed and was rolled back: {0}")]
    TransactionFailure(#[source] anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
