use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::order::{OrderChanges, OrderScope};
use crate::domain::role::{DELIVERY_CREW_GROUP, MANAGER_GROUP};
use crate::models::{CartLine, MenuItem, Order, OrderItem, User};
use super::{Store, StoreTx};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// One mutex guards the whole state. A transaction holds the owned guard for
// its lifetime and works on a staged copy, which replaces the state only on
// commit. Fail points make a chosen transaction step return an error.
//
// ============================================================================

/// Transaction step that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    LockCart,
    InsertOrder,
    InsertOrderItems,
    RemoveCartLines,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    tokens: HashMap<String, Uuid>,
    menu_items: HashMap<Uuid, MenuItem>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    fail_point: Option<FailPoint>,
}

impl MemoryState {
    fn check(&self, step: FailPoint) -> Result<()> {
        if self.fail_point == Some(step) {
            bail!("injected storage fault at {:?}", step);
        }
        Ok(())
    }

    fn cart_of(&self, user: Uuid) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> =
            self.cart.iter().filter(|line| line.user == user).cloned().collect();
        lines.sort_by_key(|line| line.created_at);
        lines
    }

    fn remove_cart_of(&mut self, user: Uuid) -> u64 {
        let before = self.cart.len();
        self.cart.retain(|line| line.user != user);
        (before - self.cart.len()) as u64
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: &User, token: &str) {
        let mut state = self.state.lock().await;
        state.users.insert(user.id, user.clone());
        state.tokens.insert(token.to_string(), user.id);
    }

    pub async fn add_menu_item(&self, item: &MenuItem) {
        self.state.lock().await.menu_items.insert(item.id, item.clone());
    }

    /// Make the given checkout step fail until cleared with `None`.
    #[cfg(test)]
    pub async fn fail_on(&self, point: Option<FailPoint>) {
        self.state.lock().await.fail_point = point;
    }

    /// Users and menu for running the service without a database.
    /// Returns `(username, token)` pairs.
    pub async fn seed_demo(&self) -> Vec<(String, String)> {
        let accounts = [
            (User::new("manager").with_group(MANAGER_GROUP), "manager-token"),
            (User::new("delivery").with_group(DELIVERY_CREW_GROUP), "delivery-token"),
            (User::new("customer"), "customer-token"),
        ];
        let mut tokens = Vec::new();
        for (user, token) in &accounts {
            self.add_user(user, token).await;
            tokens.push((user.username.clone(), token.to_string()));
        }

        let mains = Uuid::new_v4();
        let desserts = Uuid::new_v4();
        let menu = [
            ("Greek Salad", Decimal::new(1250, 2), mains, true),
            ("Bruschetta", Decimal::new(799, 2), mains, false),
            ("Lemon Dessert", Decimal::new(500, 2), desserts, true),
        ];
        for (title, price, category, featured) in menu {
            let item = MenuItem {
                id: Uuid::new_v4(),
                title: title.to_string(),
                price,
                category,
                featured,
            };
            tracing::info!(menuitem = %item.id, title, price = %item.price, "Seeded menu item");
            self.add_menu_item(&item).await;
        }

        tokens
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .get(token)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn menu_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
        Ok(self.state.lock().await.menu_items.get(&id).cloned())
    }

    async fn cart_lines(&self, user: Uuid) -> Result<Vec<CartLine>> {
        Ok(self.state.lock().await.cart_of(user))
    }

    async fn insert_cart_line(&self, line: &CartLine) -> Result<()> {
        self.state.lock().await.cart.push(line.clone());
        Ok(())
    }

    async fn delete_cart(&self, user: Uuid) -> Result<u64> {
        Ok(self.state.lock().await.remove_cart_of(user))
    }

    async fn orders(&self, scope: OrderScope) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> =
            state.orders.iter().filter(|o| scope.contains(o)).cloned().collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }

    async fn order(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id && scope.contains(o))
            .cloned())
    }

    async fn order_items(&self, order: Uuid) -> Result<Vec<OrderItem>> {
        let state = self.state.lock().await;
        Ok(state
            .order_items
            .iter()
            .filter(|item| item.order == order)
            .cloned()
            .collect())
    }

    async fn update_order(
        &self,
        id: Uuid,
        scope: OrderScope,
        changes: &OrderChanges,
    ) -> Result<Option<Order>> {
        let mut state = self.state.lock().await;
        Ok(state.orders.iter_mut().find(|o| o.id == id && scope.contains(o)).map(|order| {
            changes.apply_to(order);
            order.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid, scope: OrderScope) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.orders.iter().any(|o| o.id == id && scope.contains(o)) {
            return Ok(false);
        }
        state.orders.retain(|o| o.id != id);
        state.order_items.retain(|item| item.order != id);
        Ok(true)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_cart(&mut self, user: Uuid) -> Result<Vec<CartLine>> {
        self.staged.check(FailPoint::LockCart)?;
        Ok(self.staged.cart_of(user))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.staged.check(FailPoint::InsertOrder)?;
        self.staged.orders.push(order.clone());
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()> {
        self.staged.check(FailPoint::InsertOrderItems)?;
        self.staged.order_items.extend_from_slice(items);
        Ok(())
    }

    async fn remove_cart_lines(&mut self, lines: &[Uuid]) -> Result<u64> {
        self.staged.check(FailPoint::RemoveCartLines)?;
        let before = self.staged.cart.len();
        self.staged.cart.retain(|line| !lines.contains(&line.id));
        Ok((before - self.staged.cart.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTx { mut guard, staged } = *self;
        staged.check(FailPoint::Commit)?;
        *guard = staged;
        tracing::debug!("Committed in-memory transaction");
        Ok(())
    }
}
