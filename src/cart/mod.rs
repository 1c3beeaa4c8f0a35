//! Client cart state
//!
//! A cart of selected services and products, mirrored to a key/value store on
//! every change. Guests share the `cart:guest` key; a signed-in user gets
//! `cart:<email>`. Signing in folds the guest cart into the user's cart and
//! signing out drops the user's stored cart.

mod storage;

pub use storage::{CartStorage, MemoryStorage};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GUEST_KEY: &str = "cart:guest";

#[derive(Debug, Error)]
pub enum CartError {
    #[error("stored cart under {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Service,
    Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl CartItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: f64, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            quantity: 1,
            kind,
        }
    }

    fn same_entry(&self, id: &str, kind: ItemKind) -> bool {
        self.id == id && self.kind == kind
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, bumping the quantity if the same id and type is already present
    pub fn add(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.same_entry(&item.id, item.kind))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity.max(1)),
            None => {
                let quantity = item.quantity.max(1);
                self.items.push(CartItem { quantity, ..item });
            }
        }
    }

    /// Remove an item entirely. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str, kind: ItemKind) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.same_entry(id, kind));
        self.items.len() != before
    }

    /// Set an item's quantity; zero removes it
    pub fn set_quantity(&mut self, id: &str, kind: ItemKind, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id, kind);
        }
        match self.items.iter_mut().find(|item| item.same_entry(id, kind)) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum()
    }

    /// Fold another cart into this one
    pub fn merge(&mut self, other: Cart) {
        for item in other.items {
            self.add(item);
        }
    }
}

pub fn user_key(email: &str) -> String {
    format!("cart:{}", email.trim().to_lowercase())
}

/// Cart bound to a storage key, persisted after every mutation
pub struct CartSession<S: CartStorage> {
    storage: S,
    key: String,
    cart: Cart,
}

impl<S: CartStorage> CartSession<S> {
    /// Open the guest cart
    pub fn open(storage: S) -> Result<Self, CartError> {
        let cart = load(&storage, GUEST_KEY)?;
        Ok(Self {
            storage,
            key: GUEST_KEY.to_string(),
            cart,
        })
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_guest(&self) -> bool {
        self.key == GUEST_KEY
    }

    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        self.cart.add(item);
        self.persist()
    }

    pub fn remove(&mut self, id: &str, kind: ItemKind) -> Result<bool, CartError> {
        let removed = self.cart.remove(id, kind);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn set_quantity(&mut self, id: &str, kind: ItemKind, quantity: u32) -> Result<bool, CartError> {
        let changed = self.cart.set_quantity(id, kind, quantity);
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    pub fn clear(&mut self) -> Result<(), CartError> {
        self.cart.clear();
        self.persist()
    }

    /// Switch to the user's cart, carrying over whatever the guest had selected
    pub fn login(&mut self, email: &str) -> Result<(), CartError> {
        let key = user_key(email);
        let mut cart = load(&self.storage, &key)?;

        if self.is_guest() {
            cart.merge(std::mem::take(&mut self.cart));
            self.storage.remove(GUEST_KEY);
        }

        self.key = key;
        self.cart = cart;
        self.persist()?;

        tracing::debug!(key = %self.key, items = self.cart.len(), "Cart bound to user");
        Ok(())
    }

    /// Drop the user's stored cart and fall back to an empty guest cart
    pub fn logout(&mut self) {
        if !self.is_guest() {
            self.storage.remove(&self.key);
        }
        self.key = GUEST_KEY.to_string();
        self.cart.clear();
    }

    fn persist(&self) -> Result<(), CartError> {
        let json = serde_json::to_string(&self.cart)?;
        self.storage.set(&self.key, json);
        Ok(())
    }
}

fn load<S: CartStorage>(storage: &S, key: &str) -> Result<Cart, CartError> {
    match storage.get(key) {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| CartError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(Cart::new()),
    }
}
