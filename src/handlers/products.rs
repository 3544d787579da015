use super::validate_price;
use crate::error::AppError;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: String,
    #[validate(custom(function = validate_price))]
    pub price: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom(function = validate_price))]
    pub price: Option<Decimal>,
    pub description: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.db.list_products().await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    request.validate()?;

    let product = state
        .db
        .create_product(&CreateProduct {
            name: request.name,
            price: request.price,
            description: request.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", product_id)))?;

    Ok(Json(product))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    request.validate()?;

    let product = state
        .db
        .update_product(
            product_id,
            &UpdateProduct {
                name: request.name,
                price: request.price,
                description: request.description,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", product_id)))?;

    Ok(Json(product))
}

#[tracing::instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_product(product_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Product {} not found",
            product_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_product_price_is_a_validation_error() {
        let request = CreateProductRequest {
            name: "Laptop".to_string(),
            price: "-1.00".parse().unwrap(),
            description: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_product_price_is_accepted() {
        let request = CreateProductRequest {
            name: "Laptop".to_string(),
            price: "0.00".parse().unwrap(),
            description: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn negative_price_update_is_a_validation_error() {
        let request = UpdateProductRequest {
            name: None,
            price: Some("-0.01".parse().unwrap()),
            description: None,
        };
        assert!(request.validate().is_err());
    }
}
