// ============================================================================
// Durable Store
// ============================================================================
//
// The single shared mutable resource of the service. Two backends:
// - postgres - sqlx + PostgreSQL, used when a database URL is configured
// - memory   - in-process state, used for tests and the local demo mode
//
// Plain reads and single-statement writes go through `Store`. Checkout runs
// inside a `StoreTx`; dropping a transaction without `commit` rolls it back.
//
// ============================================================================

mod memory;
mod postgres;

pub use memory::MemoryStore;
#[cfg(test)]
pub use memory::FailPoint;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{OrderChanges, OrderScope};
use crate::models::{CartLine, MenuItem, Order, OrderItem, User};

#[async_trait]
pub trait Store: Send + Sync {
    async fn user_by_token(&self, token: &str) -> Result<Option<User>>;

    async fn user(&self, id: Uuid) -> Result<Option<User>>;

    async fn menu_item(&self, id: Uuid) -> Result<Option<MenuItem>>;

    async fn cart_lines(&self, user: Uuid) -> Result<Vec<CartLine>>;

    async fn insert_cart_line(&self, line: &CartLine) -> Result<()>;

    /// Returns the number of lines removed.
    async fn delete_cart(&self, user: Uuid) -> Result<u64>;

    /// Orders visible in `scope`, newest first.
    async fn orders(&self, scope: OrderScope) -> Result<Vec<Order>>;

    /// A single order, only if it falls inside `scope`.
    async fn order(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>>;

    async fn order_items(&self, order: Uuid) -> Result<Vec<OrderItem>>;

    /// Writes only the fields present in `changes`, and only if the order
    /// is still inside `scope`.
    async fn update_order(
        &self,
        id: Uuid,
        scope: OrderScope,
        changes: &OrderChanges,
    ) -> Result<Option<Order>>;

    /// Deletes the order (and its items) only if it is still inside `scope`.
    async fn delete_order(&self, id: Uuid, scope: OrderScope) -> Result<bool>;

    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// Transaction boundary for checkout.
#[async_trait]
pub trait StoreTx: Send {
    /// Reads the user's cart and holds it against concurrent checkouts.
    async fn lock_cart(&mut self, user: Uuid) -> Result<Vec<CartLine>>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// All-or-nothing bulk insert.
    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()>;

    /// Deletes exactly the given lines; lines added after `lock_cart`
    /// stay in the cart.
    async fn remove_cart_lines(&mut self, lines: &[Uuid]) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
