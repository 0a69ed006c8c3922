use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::domain::order::{OrderChanges, OrderScope};
use crate::models::{CartLine, MenuItem, Order, OrderItem, OrderStatus, User};
use super::{Store, StoreTx};

// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Tables (see migrations/):
// - users, user_groups, auth_tokens   - identity, read-only here
// - categories, menu_items            - menu, read-only here
// - cart_lines                        - pending lines per user
// - orders, order_items               - written by checkout
//
// Checkout locks the caller's cart rows with FOR UPDATE, so a concurrent
// duplicate checkout waits and then sees an empty cart.
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, user_id, delivery_crew_id, status, total, date";
const CART_COLUMNS: &str = "id, user_id, menuitem_id, quantity, unit_price, price, created_at";

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    delivery_crew_id: Option<Uuid>,
    status: i16,
    total: Decimal,
    date: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = anyhow::Error;

    fn try_from(row: OrderRow) -> Result<Self> {
        let status = OrderStatus::from_code(row.status)
            .ok_or_else(|| anyhow!("unknown order status code {} on order {}", row.status, row.id))?;
        Ok(Order {
            id: row.id,
            user: row.user_id,
            delivery_crew: row.delivery_crew_id,
            status,
            total: row.total,
            date: row.date,
        })
    }
}

#[derive(FromRow)]
struct CartLineRow {
    id: Uuid,
    user_id: Uuid,
    menuitem_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            user: row.user_id,
            menuitem: row.menuitem_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    menuitem_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order: row.order_id,
            menuitem: row.menuitem_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            price: row.price,
        }
    }
}

#[derive(FromRow)]
struct MenuItemRow {
    id: Uuid,
    title: String,
    price: Decimal,
    category_id: Uuid,
    featured: bool,
}

/// Narrows a `WHERE id = …` clause to the orders visible in `scope`.
fn push_scope(query: &mut QueryBuilder<'static, Postgres>, scope: OrderScope) {
    if let Some(owner) = scope.owner() {
        query.push(" AND user_id = ").push_bind(owner);
    }
    if let Some(crew) = scope.assignee() {
        query.push(" AND delivery_crew_id = ").push_bind(crew);
    }
}

fn update_order_query(
    id: Uuid,
    scope: OrderScope,
    changes: &OrderChanges,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE orders SET ");
    let mut assignments = query.separated(", ");
    if let Some(status) = changes.status {
        assignments.push("status = ").push_bind_unseparated(status.code());
    }
    if let Some(crew) = changes.delivery_crew {
        assignments.push("delivery_crew_id = ").push_bind_unseparated(crew);
    }
    query.push(" WHERE id = ").push_bind(id);
    push_scope(&mut query, scope);
    query.push(format!(" RETURNING {ORDER_COLUMNS}"));
    query
}

fn delete_order_query(id: Uuid, scope: OrderScope) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("DELETE FROM orders WHERE id = ");
    query.push_bind(id);
    push_scope(&mut query, scope);
    query
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn load_user(&self, row: Option<(Uuid, String)>) -> Result<Option<User>> {
        let Some((id, username)) = row else {
            return Ok(None);
        };
        let groups = sqlx::query_scalar::<_, String>(
            "SELECT group_name FROM user_groups WHERE user_id = $1 ORDER BY group_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(User { id, username, groups }))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT u.id, u.username FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.key = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, (Uuid, String)>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.load_user(row).await
    }

    async fn menu_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
        let row = sqlx::query_as::<_, MenuItemRow>(
            "SELECT id, title, price, category_id, featured FROM menu_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| MenuItem {
            id: row.id,
            title: row.title,
            price: row.price,
            category: row.category_id,
            featured: row.featured,
        }))
    }

    async fn cart_lines(&self, user: Uuid) -> Result<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_lines WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn insert_cart_line(&self, line: &CartLine) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO cart_lines ({CART_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(line.id)
        .bind(line.user)
        .bind(line.menuitem)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.price)
        .bind(line.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_cart(&self, user: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn orders(&self, scope: OrderScope) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ($1::uuid IS NULL OR user_id = $1)
               AND ($2::uuid IS NULL OR delivery_crew_id = $2)
             ORDER BY date DESC"
        ))
        .bind(scope.owner())
        .bind(scope.assignee())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn order(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE id = $1
               AND ($2::uuid IS NULL OR user_id = $2)
               AND ($3::uuid IS NULL OR delivery_crew_id = $3)"
        ))
        .bind(id)
        .bind(scope.owner())
        .bind(scope.assignee())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn order_items(&self, order: Uuid) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, menuitem_id, quantity, unit_price, price
             FROM order_items WHERE order_id = $1",
        )
        .bind(order)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn update_order(
        &self,
        id: Uuid,
        scope: OrderScope,
        changes: &OrderChanges,
    ) -> Result<Option<Order>> {
        if changes.is_empty() {
            return self.order(id, scope).await;
        }

        let row = update_order_query(id, scope, changes)
            .build_query_as::<OrderRow>()
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn delete_order(&self, id: Uuid, scope: OrderScope) -> Result<bool> {
        // order_items cascade
        let result = delete_order_query(id, scope).build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_cart(&mut self, user: Uuid) -> Result<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_lines WHERE user_id = $1 ORDER BY created_at FOR UPDATE"
        ))
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(order.id)
        .bind(order.user)
        .bind(order.delivery_crew)
        .bind(order.status.code())
        .bind(order.total)
        .bind(order.date)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_items (id, order_id, menuitem_id, quantity, unit_price, price) ",
        );
        query.push_values(items, |mut row, item| {
            row.push_bind(item.id)
                .push_bind(item.order)
                .push_bind(item.menuitem)
                .push_bind(item.quantity)
                .push_bind(item.unit_price)
                .push_bind(item.price);
        });
        query.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn remove_cart_lines(&mut self, lines: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
            .bind(lines.to_vec())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
