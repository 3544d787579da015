//! HTTP handlers for the invoicing backend.

pub mod customers;
pub mod health;
pub mod invoices;
pub mod products;
pub mod sales;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Shared rule for monetary request fields: prices must not be negative.
pub(crate) fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        let mut err = ValidationError::new("price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}
