//! Sale model.

use super::{Customer, SaleItem};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A sale row. `total` is computed from the items at creation time and is
/// not recomputed if items are mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub sale_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub sale_date: DateTime<Utc>,
    pub total: Decimal,
    pub issuer_name: String,
    pub created_utc: DateTime<Utc>,
}

/// A fully-loaded sale: the row plus its resolved customer and items in
/// submission order. This is what the renderer and the detail endpoint
/// consume.
#[derive(Debug, Clone)]
pub struct SaleDetail {
    pub sale: Sale,
    pub customer: Option<Customer>,
    pub items: Vec<SaleItem>,
}

/// Input for creating a sale. The customer is resolved or created by exact
/// name match inside the same transaction as the sale write.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub customer_name: String,
    pub issuer_name: String,
    pub items: Vec<super::CreateSaleItem>,
}

impl CreateSale {
    /// Exact decimal total over the line items: Σ quantity × price.
    /// This is the value stored on the sale row.
    pub fn total(&self) -> Decimal {
        self.items.iter().fold(Decimal::ZERO, |acc, item| {
            acc + Decimal::from(item.quantity) * item.price
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateSaleItem;

    // Customer reuse under the unique name constraint, rollback of partial
    // writes, and the delete cascades all require a live database: they are
    // enforced by the migration DDL and the transaction in
    // Database::create_sale. Only the pure total arithmetic is unit tested
    // here.

    fn sale_with_items(items: Vec<CreateSaleItem>) -> CreateSale {
        CreateSale {
            customer_name: "Acme Ltd".to_string(),
            issuer_name: "Demo Admin".to_string(),
            items,
        }
    }

    fn item(quantity: i32, price: &str) -> CreateSaleItem {
        CreateSaleItem {
            product_id: None,
            product_name: "Laptop".to_string(),
            quantity,
            price: price.parse().unwrap(),
        }
    }

    #[test]
    fn total_is_the_exact_decimal_sum_of_the_items() {
        let sale = sale_with_items(vec![item(1, "350000.00"), item(2, "5000.00")]);
        assert_eq!(sale.total(), "360000.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn empty_item_list_totals_zero() {
        assert_eq!(sale_with_items(vec![]).total(), Decimal::ZERO);
    }

    #[test]
    fn fractional_prices_do_not_drift() {
        let sale = sale_with_items(vec![item(3, "0.10")]);
        assert_eq!(sale.total(), "0.30".parse::<Decimal>().unwrap());
    }
}
