//! Checkout policy.

use crate::model::GeoPoint;
use serde::{Deserialize, Serialize};

/// Configuration for order placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    /// Store Σ(price × quantity) instead of the client's claimed total.
    #[serde(default = "default_true")]
    pub recompute_total: bool,

    /// Reject lines that would drive a product's stock below zero.
    #[serde(default = "default_true")]
    pub enforce_stock: bool,

    /// Latitude used when a checkout carries none.
    #[serde(default = "default_fallback_lat")]
    pub fallback_lat: f64,

    /// Longitude used when a checkout carries none.
    #[serde(default = "default_fallback_lng")]
    pub fallback_lng: f64,
}

impl OrdersConfig {
    pub fn fallback(&self) -> GeoPoint {
        GeoPoint {
            lat: self.fallback_lat,
            lng: self.fallback_lng,
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            recompute_total: true,
            enforce_stock: true,
            fallback_lat: default_fallback_lat(),
            fallback_lng: default_fallback_lng(),
        }
    }
}

fn default_true() -> bool {
    true
}

// San Francisco city center
fn default_fallback_lat() -> f64 {
    37.7749
}

fn default_fallback_lng() -> f64 {
    -122.4194
}
