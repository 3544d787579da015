use super::validate_price;
use crate::error::AppError;
use crate::models::{CreateSale, CreateSaleItem, Customer, Sale, SaleDetail};
use crate::services::metrics::SALES_TOTAL;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Issuer name cannot be empty"))]
    pub issuer_name: String,
    #[serde(default)]
    pub sale_items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaleItemRequest {
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(custom(function = validate_price))]
    pub price: Decimal,
}

impl CreateSaleRequest {
    /// Full request validation: top-level fields plus every line item.
    /// Runs before any write.
    fn validate_all(&self) -> Result<(), AppError> {
        self.validate()?;
        for item in &self.sale_items {
            item.validate()?;
        }
        Ok(())
    }

    fn into_input(self) -> CreateSale {
        CreateSale {
            customer_name: self.customer_name,
            issuer_name: self.issuer_name,
            items: self
                .sale_items
                .into_iter()
                .map(|item| CreateSaleItem {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// Sale detail response: nested customer summary and items with their
/// computed line totals.
#[derive(Debug, Serialize)]
pub struct SaleDetailResponse {
    pub sale_id: Uuid,
    pub customer: Option<Customer>,
    pub sale_date: DateTime<Utc>,
    pub total: Decimal,
    pub issuer_name: String,
    pub created_utc: DateTime<Utc>,
    pub sale_items: Vec<SaleItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub sale_item_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
    pub created_utc: DateTime<Utc>,
}

impl From<SaleDetail> for SaleDetailResponse {
    fn from(detail: SaleDetail) -> Self {
        let sale_items = detail
            .items
            .iter()
            .map(|item| SaleItemResponse {
                sale_item_id: item.sale_item_id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.price,
                total: item.total(),
                created_utc: item.created_utc,
            })
            .collect();

        Self {
            sale_id: detail.sale.sale_id,
            customer: detail.customer,
            sale_date: detail.sale.sale_date,
            total: detail.sale.total,
            issuer_name: detail.sale.issuer_name,
            created_utc: detail.sale.created_utc,
            sale_items,
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_sales(State(state): State<AppState>) -> Result<Json<Vec<Sale>>, AppError> {
    Ok(Json(state.db.list_sales().await?))
}

#[tracing::instrument(skip(state, request), fields(customer_name = %request.customer_name))]
pub async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleDetailResponse>), AppError> {
    if let Err(e) = request.validate_all() {
        SALES_TOTAL.with_label_values(&["rejected"]).inc();
        return Err(e);
    }

    let detail = state.db.create_sale(&request.into_input()).await?;
    SALES_TOTAL.with_label_values(&["created"]).inc();

    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleDetailResponse>, AppError> {
    let detail = state
        .db
        .get_sale_detail(sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale {} not found", sale_id)))?;

    Ok(Json(detail.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_sale(sale_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Sale {} not found",
            sale_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_items(items: Vec<SaleItemRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            customer_name: "Acme Ltd".to_string(),
            issuer_name: "Demo Admin".to_string(),
            sale_items: items,
        }
    }

    fn item(quantity: i32, price: &str) -> SaleItemRequest {
        SaleItemRequest {
            product_id: None,
            product_name: "Laptop".to_string(),
            quantity,
            price: price.parse().unwrap(),
        }
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let request = request_with_items(vec![item(0, "350000.00")]);
        assert!(request.validate_all().is_err());
    }

    #[test]
    fn negative_price_is_rejected_as_a_validation_error() {
        let request = request_with_items(vec![item(1, "-0.01")]);
        assert!(matches!(
            request.validate_all(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn zero_price_is_accepted() {
        let request = request_with_items(vec![item(1, "0.00")]);
        assert!(request.validate_all().is_ok());
    }

    #[test]
    fn empty_customer_name_is_rejected() {
        let mut request = request_with_items(vec![item(1, "100.00")]);
        request.customer_name = String::new();
        assert!(matches!(
            request.validate_all(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn empty_item_list_is_accepted() {
        let request = request_with_items(vec![]);
        assert!(request.validate_all().is_ok());
    }
}
