//! Sale line-item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One line of a sale. `product_name` is a creation-time snapshot and is
/// never re-synced from the product, so historical invoices stay accurate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaleItem {
    pub sale_item_id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

impl SaleItem {
    /// Line total, computed on read rather than stored.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// Input for one line item of a new sale.
#[derive(Debug, Clone)]
pub struct CreateSaleItem {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}
