//! Order domain types.
//!
//! Orders are immutable snapshots: item lines and the shipping address are
//! copied at checkout so later catalog or address edits never reach them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use toko_core::{Money, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// Shipping method used when the client does not pick one.
pub const DEFAULT_SHIPPING_METHOD: &str = "Reguler";

/// One purchased product, copied from the catalog at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: String,
}

/// Recipient details copied into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub full_address: String,
}

/// Money figures of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub service_fee: Money,
    pub discount: Money,
    pub grand_total: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub summary: OrderSummary,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to persist an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub summary: OrderSummary,
}
