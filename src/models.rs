use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// ============================================================================
// Persisted Records
// ============================================================================

/// An authenticated identity and its group memberships.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub groups: Vec<String>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub category: Uuid,
    pub featured: bool,
}

/// Largest amount a money column (`NUMERIC(10, 2)`) can hold.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

/// A pending line in a user's cart.
///
/// `price` is always `unit_price * quantity`; the only way to build a line
/// is [`CartLine::new`], which snapshots the menu item's current price.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub user: Uuid,
    pub menuitem: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(user: Uuid, item: &MenuItem, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            menuitem: item.id,
            quantity,
            unit_price: item.price,
            price: item.price * Decimal::from(quantity),
            created_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// Storage code (SMALLINT column).
    pub fn code(self) -> i16 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::OutForDelivery => 1,
            OrderStatus::Delivered => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::Pending),
            1 => Some(OrderStatus::OutForDelivery),
            2 => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub delivery_crew: Option<Uuid>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub date: DateTime<Utc>,
}

/// Immutable snapshot of a cart line taken at checkout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order: Uuid,
    pub menuitem: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub price: Decimal,
}

impl OrderItem {
    pub fn from_cart_line(order: Uuid, line: &CartLine) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            menuitem: line.menuitem,
            quantity: line.quantity,
            unit_price: line.unit_price,
            price: line.price,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
