use std::sync::Arc;

use rust_decimal::Decimal;

use crate::metrics::Metrics;
use crate::models::{max_amount, CartLine, User};
use crate::store::Store;

use super::commands::AddToCart;
use super::errors::CartError;

// ============================================================================
// Cart Command Handler
// ============================================================================

#[derive(Clone)]
pub struct CartCommandHandler {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
}

impl CartCommandHandler {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn list(&self, user: &User) -> Result<Vec<CartLine>, CartError> {
        Ok(self.store.cart_lines(user.id).await?)
    }

    /// Add a menu item at its current price. The line and the resulting
    /// cart total must both fit a money column.
    pub async fn add(&self, user: &User, command: AddToCart) -> Result<CartLine, CartError> {
        if command.quantity < 1 {
            return Err(CartError::InvalidQuantity(command.quantity));
        }

        let item = self
            .store
            .menu_item(command.menuitem)
            .await?
            .ok_or(CartError::MenuItemNotFound(command.menuitem))?;

        let line = CartLine::new(user.id, &item, command.quantity);
        let cart_total: Decimal = self
            .store
            .cart_lines(user.id)
            .await?
            .iter()
            .map(|existing| existing.price)
            .sum();
        let new_total = cart_total + line.price;
        if new_total > max_amount() {
            return Err(CartError::AmountTooLarge(new_total));
        }
        self.store.insert_cart_line(&line).await?;
        self.metrics.record_cart_line_added();

        tracing::info!(
            user_id = %user.id,
            menuitem = %item.id,
            quantity = line.quantity,
            price = %line.price,
            "Added line to cart"
        );
        Ok(line)
    }

    /// Remove every line; clearing an empty cart is not an error.
    pub async fn clear(&self, user: &User) -> Result<u64, CartError> {
        let deleted = self.store.delete_cart(user.id).await?;
        tracing::info!(user_id = %user.id, deleted, "Cleared cart");
        Ok(deleted)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    async fn setup() -> (CartCommandHandler, User, MenuItem) {
        let store = MemoryStore::new();
        let user = User::new("customer");
        store.add_user(&user, "customer-token").await;

        let item = MenuItem {
            id: Uuid::new_v4(),
            title: "Bruschetta".to_string(),
            price: Decimal::new(1000, 2),
            category: Uuid::new_v4(),
            featured: true,
        };
        store.add_menu_item(&item).await;

        let handler = CartCommandHandler::new(Arc::new(store), Arc::new(Metrics::new().unwrap()));
        (handler, user, item)
    }

    #[tokio::test]
    async fn test_add_snapshots_price() {
        let (handler, user, item) = setup().await;

        let line = handler
            .add(&user, AddToCart { menuitem: item.id, quantity: 2 })
            .await
            .unwrap();

        assert_eq!(line.user, user.id);
        assert_eq!(line.unit_price, Decimal::new(1000, 2));
        assert_eq!(line.price, Decimal::new(2000, 2));

        let lines = handler.list(&user).await.unwrap();
        assert_eq!(lines, vec![line]);
        for line in &lines {
            assert_eq!(line.price, line.unit_price * Decimal::from(line.quantity));
        }
    }

    #[tokio::test]
    async fn test_add_unknown_menu_item() {
        let (handler, user, _) = setup().await;
        let missing = Uuid::new_v4();

        let result = handler.add(&user, AddToCart { menuitem: missing, quantity: 1 }).await;

        assert!(matches!(result, Err(CartError::MenuItemNotFound(id)) if id == missing));
        assert!(handler.list(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let (handler, user, item) = setup().await;

        let result = handler.add(&user, AddToCart { menuitem: item.id, quantity: 0 }).await;

        assert!(matches!(result, Err(CartError::InvalidQuantity(0))));
    }

    #[tokio::test]
    async fn test_add_rejects_amounts_beyond_money_column() {
        let (handler, user, item) = setup().await;

        // 10.00 * 9_999_999 fits; one more unit would not.
        let line = handler
            .add(&user, AddToCart { menuitem: item.id, quantity: 9_999_999 })
            .await
            .unwrap();
        assert_eq!(line.price, Decimal::new(99_999_990_00, 2));

        let result = handler.add(&user, AddToCart { menuitem: item.id, quantity: 1 }).await;
        assert!(matches!(result, Err(CartError::AmountTooLarge(total)) if total == Decimal::new(100_000_000_00, 2)));

        handler.clear(&user).await.unwrap();
        let result = handler.add(&user, AddToCart { menuitem: item.id, quantity: 2_000_000_000 }).await;
        assert!(matches!(result, Err(CartError::AmountTooLarge(_))));
        assert!(handler.list(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (handler, user, item) = setup().await;
        handler.add(&user, AddToCart { menuitem: item.id, quantity: 1 }).await.unwrap();

        assert_eq!(handler.clear(&user).await.unwrap(), 1);
        assert!(handler.list(&user).await.unwrap().is_empty());

        assert_eq!(handler.clear(&user).await.unwrap(), 0);
        assert!(handler.list(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let (handler, user, item) = setup().await;
        let other = User::new("other");
        handler.add(&user, AddToCart { menuitem: item.id, quantity: 1 }).await.unwrap();

        assert!(handler.list(&other).await.unwrap().is_empty());
        assert_eq!(handler.clear(&other).await.unwrap(), 0);
        assert_eq!(handler.list(&user).await.unwrap().len(), 1);
    }
}
