use crate::domain::model::{CartLine, CartSnapshot};
use crate::domain::ports::CartSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TAX_RATE: f64 = 0.08;
pub const FREE_SHIPPING_ABOVE: f64 = 50.0;
pub const FLAT_SHIPPING: f64 = 9.99;

/// A product being put into the cart. Id, quantity and timestamp are assigned by the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub rating: f32,
}

impl NewCartItem {
    pub fn new(name: &str, price: f64, category: &str, rating: f32) -> Self {
        Self {
            name: name.to_string(),
            price,
            category: category.to_string(),
            rating,
        }
    }
}

/// The shopper's cart, owned by the UI layer. The estimator only sees its snapshots.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    next_id: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        Self {
            lines: snapshot.lines().to_vec(),
            next_id: 0,
        }
    }

    /// Adds one unit. A line with the same name gets its quantity bumped instead.
    pub fn add_item(&mut self, item: NewCartItem, now: DateTime<Utc>) -> &CartLine {
        if let Some(index) = self.lines.iter().position(|line| line.name == item.name) {
            let line = &mut self.lines[index];
            line.quantity = line.quantity.saturating_add(1);
            tracing::info!(id = %line.id, quantity = line.quantity, "{} added to cart", line.name);
            return &self.lines[index];
        }

        let id = self.next_line_id();
        tracing::info!(id = %id, "{} added to cart", item.name);
        self.lines.push(CartLine {
            id,
            name: item.name,
            unit_price: item.price,
            quantity: 1,
            category: item.category,
            rating: item.rating,
            added_at: now,
        });
        let index = self.lines.len() - 1;
        &self.lines[index]
    }

    pub fn remove_item(&mut self, id: &str) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.id == id)?;
        let removed = self.lines.remove(index);
        tracing::info!(id = %removed.id, "{} removed from cart", removed.name);
        Some(removed)
    }

    /// Sets the quantity of a line; zero or less removes it. Returns false for an unknown id.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id).is_some();
        }

        let Some(line) = self.lines.iter_mut().find(|line| line.id == id) else {
            return false;
        };
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        tracing::debug!(id = %line.id, quantity = line.quantity, "Cart quantity updated");
        true
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        tracing::info!("Cart cleared");
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(self.lines.clone())
    }

    fn next_line_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("item-{}", self.next_id);
            if !self.lines.iter().any(|line| line.id == id) {
                return id;
            }
        }
    }
}

impl CartSource for Cart {
    fn cart_snapshot(&self) -> CartSnapshot {
        self.snapshot()
    }
}

/// Order totals shown next to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
}

impl CheckoutSummary {
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        let subtotal = snapshot.total_value();
        let tax = subtotal * TAX_RATE;
        let shipping = if subtotal > FREE_SHIPPING_ABOVE {
            0.0
        } else {
            FLAT_SHIPPING
        };

        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn headphones() -> NewCartItem {
        NewCartItem::new("Wireless Bluetooth Headphones", 79.99, "Electronics", 4.5)
    }

    #[test]
    fn test_add_item_merges_by_name() {
        let mut cart = Cart::new();
        let now = Utc::now();

        let first_id = cart.add_item(headphones(), now).id.clone();
        let second = cart.add_item(headphones(), now);

        assert_eq!(second.id, first_id);
        assert_eq!(second.quantity, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_new_lines_get_unique_ids() {
        let mut cart = Cart::new();
        let now = Utc::now();

        let a = cart.add_item(headphones(), now).id.clone();
        let b = cart
            .add_item(NewCartItem::new("Organic Green Tea", 12.99, "Food", 4.8), now)
            .id
            .clone();

        assert_ne!(a, b);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let mut cart = Cart::new();
        let id = cart.add_item(headphones(), Utc::now()).id.clone();

        assert!(cart.update_quantity(&id, 3));
        assert_eq!(cart.item_count(), 3);
        assert_abs_diff_eq!(cart.total_price(), 239.97, epsilon = 1e-9);

        assert!(!cart.update_quantity("missing", 2));

        assert!(cart.update_quantity(&id, 0));
        assert!(cart.is_empty());
        assert!(cart.remove_item(&id).is_none());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(headphones(), Utc::now());
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.snapshot().is_empty());
    }

    #[test]
    fn test_from_snapshot_avoids_id_collisions() {
        let mut seeded = Cart::new();
        let now = Utc::now();
        seeded.add_item(headphones(), now);

        let mut cart = Cart::from_snapshot(seeded.snapshot());
        let id = cart
            .add_item(NewCartItem::new("Organic Green Tea", 12.99, "Food", 4.8), now)
            .id
            .clone();
        assert_eq!(id, "item-2");
    }

    #[test]
    fn test_checkout_summary() {
        let mut cart = Cart::new();
        let id = cart.add_item(headphones(), Utc::now()).id.clone();

        let summary = CheckoutSummary::from_snapshot(&cart.snapshot());
        assert_abs_diff_eq!(summary.tax, 79.99 * 0.08, epsilon = 1e-9);
        assert_eq!(summary.shipping, 0.0);

        cart.remove_item(&id);
        cart.add_item(NewCartItem::new("Organic Green Tea", 12.99, "Food", 4.8), Utc::now());
        let small = CheckoutSummary::from_snapshot(&cart.snapshot());
        assert_eq!(small.shipping, FLAT_SHIPPING);
        assert_abs_diff_eq!(small.total, 12.99 * 1.08 + 9.99, epsilon = 1e-9);
    }
}
