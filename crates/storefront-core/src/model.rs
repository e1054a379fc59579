//! Domain model for the storefront.
//!
//! These are the values that cross crate boundaries: repositories return them,
//! the order engine consumes them and the HTTP surface serializes them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Accounts
// =============================================================================

/// Account role. Gates the admin panel on the client side only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Public view of a user account. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    pub stock: i64,
}

/// Product fields minus the id, used for create and full-record update.
///
/// Only `name` and `price` are required. Ranges are not checked: a negative
/// price or an empty name is stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: i64,
}

impl ProductInput {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            image_url: self.image_url,
            stock: self.stock,
        }
    }
}

/// Storefront search box and category selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Exact category label. `All` or empty means any category.
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring of the name or description.
    #[serde(default)]
    pub q: Option<String>,
}

impl ProductFilter {
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "All")
    }

    fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// True when the filter lets every product through.
    pub fn is_empty(&self) -> bool {
        self.category().is_none() && self.needle().is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category()
            && product.category != category
        {
            return false;
        }
        match self.needle() {
            Some(needle) => {
                product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    /// Keep only the matching products, preserving order.
    pub fn apply(&self, mut products: Vec<Product>) -> Vec<Product> {
        if !self.is_empty() {
            products.retain(|p| self.matches(p));
        }
        products
    }
}

/// Distinct category labels of a catalog, sorted. Blank labels are skipped.
pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.category.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Orders
// =============================================================================

/// Round a currency amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// A geocoordinate attached to an order for the tracking map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One entry of a checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The storefront sends whole cart products, so `id` is accepted too.
    #[serde(alias = "id")]
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price captured when the product was added to the cart.
    pub price: f64,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A checkout as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<CartLine>,
    /// Total claimed by the client.
    pub total_amount: f64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl NewOrder {
    /// Σ(price × quantity) over the cart, rounded to cents.
    pub fn cart_total(&self) -> f64 {
        round_cents(self.items.iter().map(CartLine::subtotal).sum())
    }

    /// Submitted coordinates, each falling back independently.
    pub fn location_or(&self, fallback: GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: self.lat.unwrap_or(fallback.lat),
            lng: self.lng.unwrap_or(fallback.lng),
        }
    }
}

/// Order lifecycle state. Orders are created pending and never transitioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

/// A line of a placed order, with the snapshot unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
