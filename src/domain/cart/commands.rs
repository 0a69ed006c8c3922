use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Cart Commands
// ============================================================================

/// Body of `POST /api/cart/menu-items`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub menuitem: Uuid,
    pub quantity: i32,
}
