//! Persistent client state
//!
//! The session token, the signed-in user and the shopping cart, kept in a
//! single JSON file between runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ClientError;
use crate::models::{ProductType, User};

/// One product in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_type: ProductType,
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Discount price when set, list price otherwise
    pub fn effective_price(&self) -> f64 {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> f64 {
        self.effective_price() * f64::from(self.quantity)
    }

    fn same_product(&self, product_type: ProductType, product_id: i64) -> bool {
        self.product_type == product_type && self.product_id == product_id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    cart_items: Vec<CartItem>,
    #[serde(default)]
    cart_total: f64,
}

/// File-backed client state
#[derive(Debug, Clone)]
pub struct ClientStore {
    path: PathBuf,
    data: StoreData,
}

impl ClientStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => StoreData::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ClientError::Decode(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };

        let mut store = Self { path, data };
        store.recompute_total();
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the store, replacing the file in one step
    pub fn save(&self) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(&self.data)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.data.user.as_ref()
    }

    pub fn set_session(&mut self, token: impl Into<String>, user: User) {
        self.data.token = Some(token.into());
        self.data.user = Some(user);
    }

    pub fn clear_session(&mut self) {
        self.data.token = None;
        self.data.user = None;
    }

    pub fn cart_items(&self) -> &[CartItem] {
        &self.data.cart_items
    }

    pub fn cart_total(&self) -> f64 {
        self.data.cart_total
    }

    /// Add to the cart; an item already present has its quantity raised
    pub fn add_to_cart(&mut self, item: CartItem) {
        let quantity = item.quantity.max(1);
        match self
            .data
            .cart_items
            .iter_mut()
            .find(|existing| existing.same_product(item.product_type, item.product_id))
        {
            Some(existing) => existing.quantity += quantity,
            None => self.data.cart_items.push(CartItem { quantity, ..item }),
        }
        self.recompute_total();
    }

    /// Returns whether anything was removed
    pub fn remove_from_cart(&mut self, product_type: ProductType, product_id: i64) -> bool {
        let before = self.data.cart_items.len();
        self.data
            .cart_items
            .retain(|item| !item.same_product(product_type, product_id));
        self.recompute_total();
        self.data.cart_items.len() != before
    }

    pub fn clear_cart(&mut self) {
        self.data.cart_items.clear();
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        let total: f64 = self.data.cart_items.iter().map(CartItem::line_total).sum();
        // Cents, so repeated adds do not drift
        self.data.cart_total = (total * 100.0).round() / 100.0;
    }
}
