//! Order repository.
//!
//! Item lines are stored as a JSONB array so the snapshot taken at checkout is
//! kept verbatim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use toko_core::{Money, OrderId, OrderStatus, PaymentStatus, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem, OrderSummary, ShippingAddress};

const ORDER_COLUMNS: &str = r"
    id, user_id, items, shipping_name, shipping_phone, shipping_full_address,
    shipping_method, payment_method, payment_status, order_status,
    subtotal, shipping_cost, service_fee, discount, grand_total, created_at
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    items: Json<Vec<OrderItem>>,
    shipping_name: String,
    shipping_phone: String,
    shipping_full_address: String,
    shipping_method: String,
    payment_method: String,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    subtotal: Money,
    shipping_cost: Money,
    service_fee: Money,
    discount: Money,
    grand_total: Money,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            shipping_address: ShippingAddress {
                name: row.shipping_name,
                phone: row.shipping_phone,
                full_address: row.shipping_full_address,
            },
            shipping_method: row.shipping_method,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            order_status: row.order_status,
            summary: OrderSummary {
                subtotal: row.subtotal,
                shipping_cost: row.shipping_cost,
                service_fee: row.service_fee,
                discount: row.discount,
                grand_total: row.grand_total,
            },
            created_at: row.created_at,
        }
    }
}

/// `PostgreSQL` order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO toko.orders (
                user_id, items, shipping_name, shipping_phone, shipping_full_address,
                shipping_method, payment_method, payment_status, order_status,
                subtotal, shipping_cost, service_fee, discount, grand_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(&order.shipping_address.name)
        .bind(&order.shipping_address.phone)
        .bind(&order.shipping_address.full_address)
        .bind(&order.shipping_method)
        .bind(&order.payment_method)
        .bind(order.payment_status)
        .bind(order.order_status)
        .bind(order.summary.subtotal)
        .bind(order.summary.shipping_cost)
        .bind(order.summary.service_fee)
        .bind(order.summary.discount)
        .bind(order.summary.grand_total)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM toko.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM toko.orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
