use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Field-level changes to an existing order. `None` means "leave as is";
/// `delivery_crew: Some(None)` unassigns the order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub delivery_crew: Option<Option<Uuid>>,
}

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.delivery_crew.is_none()
    }

    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(crew) = self.delivery_crew {
            order.delivery_crew = crew;
        }
    }
}

/// An order together with its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
