//! The shopper's cart, owned by one client session. Mutations persist the
//! whole item list through a [`CartStorage`] boundary; persistence is
//! best-effort and never fails the caller.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::dto::checkout::{CheckoutItem, CheckoutProduct};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i32,
}

pub trait CartStorage {
    fn load(&self) -> anyhow::Result<Vec<CartItem>>;
    fn save(&self, items: &[CartItem]) -> anyhow::Result<()>;
}

/// Durable cart storage as a JSON file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> anyhow::Result<Vec<CartItem>> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, items: &[CartItem]) -> anyhow::Result<()> {
        let raw = serde_json::to_string(items)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

pub struct CartStore<S: CartStorage> {
    items: Vec<CartItem>,
    is_open: bool,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Rehydrate from storage. Absent or corrupt storage yields an empty
    /// cart rather than an error.
    pub fn initialize(storage: S) -> Self {
        let items = match storage.load() {
            Ok(items) => items,
            Err(err) => {
                tracing::debug!(error = %err, "cart storage unavailable, starting empty");
                Vec::new()
            }
        };
        Self {
            items,
            is_open: false,
            storage,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Increment the quantity when the product is already present, otherwise
    /// insert it with quantity 1.
    pub fn add(&mut self, product: Product) {
        match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(item) => item.quantity += 1,
            None => self.items.push(CartItem {
                product,
                quantity: 1,
            }),
        }
        self.persist();
    }

    /// No-op when the product is not in the cart.
    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|i| i.product.id != product_id);
        self.persist();
    }

    /// A quantity of zero or less removes the item; otherwise the quantity
    /// is overwritten, so stored quantities stay positive.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.quantity = quantity;
        }
        self.persist();
    }

    /// Empty the cart after a completed checkout redirect.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.product.price_cents * i64::from(i.quantity))
            .sum()
    }

    /// The cart contents in the shape the checkout endpoint accepts.
    pub fn checkout_items(&self) -> Vec<CheckoutItem> {
        self.items
            .iter()
            .map(|i| CheckoutItem {
                product: CheckoutProduct {
                    id: i.product.id.clone(),
                    name: i.product.name.clone(),
                    price: i.product.price_cents,
                    package_image: i.product.package_image.clone(),
                },
                quantity: i.quantity,
            })
            .collect()
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.items) {
            tracing::warn!(error = %err, "cart persistence failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::catalog;

    struct MemoryStorage {
        saved: RefCell<Option<Vec<CartItem>>>,
    }

    impl MemoryStorage {
        fn empty() -> Self {
            Self {
                saved: RefCell::new(None),
            }
        }
    }

    impl CartStorage for MemoryStorage {
        fn load(&self) -> anyhow::Result<Vec<CartItem>> {
            match self.saved.borrow().clone() {
                Some(items) => Ok(items),
                None => anyhow::bail!("no stored cart"),
            }
        }

        fn save(&self, items: &[CartItem]) -> anyhow::Result<()> {
            *self.saved.borrow_mut() = Some(items.to_vec());
            Ok(())
        }
    }

    struct FailingStorage;

    impl CartStorage for FailingStorage {
        fn load(&self) -> anyhow::Result<Vec<CartItem>> {
            anyhow::bail!("storage offline")
        }

        fn save(&self, _items: &[CartItem]) -> anyhow::Result<()> {
            anyhow::bail!("storage offline")
        }
    }

    fn granola() -> Product {
        catalog::find("classic-granola").unwrap().clone()
    }

    fn balls() -> Product {
        catalog::find("cacao-balls").unwrap().clone()
    }

    #[test]
    fn add_increments_existing_entry() {
        let mut cart = CartStore::initialize(MemoryStorage::empty());
        cart.add(granola());
        cart.add(granola());
        cart.add(balls());

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[1].quantity, 1);
    }

    #[test]
    fn remove_is_noop_for_unknown_product() {
        let mut cart = CartStore::initialize(MemoryStorage::empty());
        cart.add(granola());
        cart.remove("not-in-cart");
        assert_eq!(cart.items().len(), 1);
        cart.remove("classic-granola");
        assert!(cart.items().is_empty());
    }

    #[test]
    fn set_quantity_zero_removes_the_item() {
        let mut cart = CartStore::initialize(MemoryStorage::empty());
        cart.add(granola());
        cart.set_quantity("classic-granola", 5);
        assert_eq!(cart.items()[0].quantity, 5);
        cart.set_quantity("classic-granola", 0);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn mutations_persist_to_storage() {
        let storage = MemoryStorage::empty();
        let mut cart = CartStore::initialize(storage);
        cart.add(granola());
        cart.clear();

        let stored = cart.storage.saved.borrow().clone().unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn storage_failure_is_swallowed() {
        let mut cart = CartStore::initialize(FailingStorage);
        cart.add(granola());
        cart.set_quantity("classic-granola", 3);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn initialize_with_corrupt_file_yields_empty_cart() {
        let path = std::env::temp_dir().join("storefront-cart-corrupt-test.json");
        std::fs::write(&path, "{not json").unwrap();
        let cart = CartStore::initialize(JsonFileStorage::new(&path));
        assert!(cart.items().is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rehydrates_previous_items_from_file() {
        let path = std::env::temp_dir().join("storefront-cart-rehydrate-test.json");
        std::fs::remove_file(&path).ok();
        {
            let mut cart = CartStore::initialize(JsonFileStorage::new(&path));
            cart.add(granola());
            cart.add(granola());
        }
        let cart = CartStore::initialize(JsonFileStorage::new(&path));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn subtotal_and_checkout_shape() {
        let mut cart = CartStore::initialize(MemoryStorage::empty());
        cart.add(granola());
        cart.set_quantity("classic-granola", 2);
        cart.add(balls());

        assert_eq!(cart.subtotal_cents(), 1200 * 2 + 900);

        let items = cart.checkout_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product.id, "classic-granola");
        assert_eq!(items[0].product.price, 1200);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn visibility_flag_has_no_business_meaning() {
        let mut cart = CartStore::initialize(MemoryStorage::empty());
        assert!(!cart.is_open());
        cart.toggle();
        assert!(cart.is_open());
        cart.close();
        assert!(!cart.is_open());
        cart.open();
        assert!(cart.is_open());
    }
}
