use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::role::{Role, DELIVERY_CREW_GROUP};
use crate::metrics::Metrics;
use crate::models::{max_amount, Order, OrderItem, OrderStatus, User};
use crate::store::Store;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::policy::{authorize, OrderScope};
use super::value_objects::OrderDetail;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Requester → Role → Policy → Store
//
// Checkout runs as one store transaction:
//   lock cart → total → insert order → bulk insert items
//     → remove the locked lines → commit
// Any failure drops the transaction, leaving no order and the cart intact.
//
// ============================================================================

#[derive(Debug)]
pub enum OrderOutcome {
    Updated(Order),
    Deleted,
}

#[derive(Clone)]
pub struct OrderCommandHandler {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
}

impl OrderCommandHandler {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Orders visible to the requester.
    pub async fn list(&self, user: &User) -> Result<Vec<Order>, OrderError> {
        let scope = OrderScope::for_requester(user, Role::resolve(user));
        let orders = self.store.orders(scope).await?;

        tracing::debug!(user_id = %user.id, scope = ?scope, count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// A single visible order with its items. Invisible orders are reported
    /// exactly like missing ones.
    pub async fn get(&self, user: &User, order_id: Uuid) -> Result<OrderDetail, OrderError> {
        let scope = OrderScope::for_requester(user, Role::resolve(user));
        let order = self
            .store
            .order(order_id, scope)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        let items = self.store.order_items(order_id).await?;

        Ok(OrderDetail { order, items })
    }

    /// Turn the requester's cart into an order.
    pub async fn checkout(&self, user: &User) -> Result<OrderDetail, OrderError> {
        let started = Instant::now();
        let result = self.run_checkout(user).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(OrderError::EmptyCart) => "empty_cart",
            Err(OrderError::TotalTooLarge(_)) => "rejected",
            Err(_) => "failure",
        };
        self.metrics.record_checkout(outcome, started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(user_id = %user.id, error = %e, "Checkout aborted");
        }
        result
    }

    async fn run_checkout(&self, user: &User) -> Result<OrderDetail, OrderError> {
        let mut tx = self.store.begin().await.map_err(OrderError::TransactionFailure)?;

        let lines = tx.lock_cart(user.id).await.map_err(OrderError::TransactionFailure)?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let total: Decimal = lines.iter().map(|line| line.price).sum();
        if total > max_amount() {
            return Err(OrderError::TotalTooLarge(total));
        }
        let order = Order {
            id: Uuid::new_v4(),
            user: user.id,
            delivery_crew: None,
            status: OrderStatus::Pending,
            total,
            date: Utc::now(),
        };
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem::from_cart_line(order.id, line))
            .collect();

        tx.insert_order(&order).await.map_err(OrderError::TransactionFailure)?;
        tx.insert_order_items(&items).await.map_err(OrderError::TransactionFailure)?;
        let locked: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
        let cleared = tx
            .remove_cart_lines(&locked)
            .await
            .map_err(OrderError::TransactionFailure)?;
        tx.commit().await.map_err(OrderError::TransactionFailure)?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            total = %order.total,
            item_count = items.len(),
            cart_lines_cleared = cleared,
            "✅ Order placed"
        );

        Ok(OrderDetail { order, items })
    }

    /// Apply a mutation to an existing order.
    pub async fn handle(
        &self,
        user: &User,
        order_id: Uuid,
        command: OrderCommand,
    ) -> Result<OrderOutcome, OrderError> {
        let role = Role::resolve(user);
        let action = command.action();

        if let Err(e) = authorize(role, &command) {
            tracing::warn!(
                user_id = %user.id,
                role = role.as_str(),
                order_id = %order_id,
                action,
                "Order mutation refused"
            );
            self.metrics.record_authorization_denial(role.as_str(), action);
            return Err(e);
        }

        let result = self.execute(user, role, order_id, command).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        self.metrics.record_order_mutation(action, outcome);
        result
    }

    async fn execute(
        &self,
        user: &User,
        role: Role,
        order_id: Uuid,
        command: OrderCommand,
    ) -> Result<OrderOutcome, OrderError> {
        let scope = OrderScope::for_requester(user, role);
        let current = self
            .store
            .order(order_id, scope)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if let OrderCommand::Delete = command {
            if !self.store.delete_order(order_id, scope).await? {
                return Err(OrderError::NotFound(order_id));
            }
            tracing::info!(order_id = %order_id, user_id = %user.id, "Order deleted");
            return Ok(OrderOutcome::Deleted);
        }

        let changes = command.changes()?;
        if let Some(Some(crew)) = changes.delivery_crew {
            self.ensure_delivery_crew(crew).await?;
        }

        if changes.is_empty() {
            return Ok(OrderOutcome::Updated(current));
        }

        let updated = self
            .store
            .update_order(order_id, scope, &changes)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        tracing::info!(
            order_id = %order_id,
            user_id = %user.id,
            status = ?changes.status,
            delivery_crew = ?changes.delivery_crew,
            "Order updated"
        );
        Ok(OrderOutcome::Updated(updated))
    }

    async fn ensure_delivery_crew(&self, crew: Uuid) -> Result<(), OrderError> {
        match self.store.user(crew).await? {
            Some(member) if member.in_group(DELIVERY_CREW_GROUP) => Ok(()),
            _ => Err(OrderError::NotDeliveryCrew(crew)),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
