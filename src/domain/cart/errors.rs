use uuid::Uuid;

// ============================================================================
// Cart Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(Uuid),

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Cart amount {0} exceeds the maximum amount")]
    AmountTooLarge(rust_decimal::Decimal),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
