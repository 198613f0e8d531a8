//! Cart endpoints
//!
//! One row per (user, product); concurrent adds collapse into a single
//! upsert that increments the quantity.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::http::{AppState, UserIdParam};
use crate::models::{CartDto, CartLine};

const CART_LINES_SQL: &str = "SELECT ci.id, ci.product_id, p.name AS product_name, \
     p.description AS product_description, p.image_url AS product_image, \
     p.price AS unit_price, ci.quantity \
     FROM cart_items ci JOIN products p ON p.id = ci.product_id \
     WHERE ci.user_id = $1 ORDER BY ci.added_at";

pub async fn get_cart(
    State(state): State<AppState>,
    Query(params): Query<UserIdParam>,
) -> Result<Json<CartDto>, ApiError> {
    let user_id = params.require()?;
    let lines = sqlx::query_as::<_, CartLine>(CART_LINES_SQL)
        .bind(user_id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(CartDto::from_lines(lines)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

pub async fn add_item(
    State(state): State<AppState>,
    Query(params): Query<UserIdParam>,
    Json(body): Json<AddToCartBody>,
) -> Result<StatusCode, ApiError> {
    let user_id = params.require()?;
    body.validate().map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let price: Option<rust_decimal::Decimal> =
        sqlx::query_scalar("SELECT price FROM products WHERE id = $1")
            .bind(body.product_id)
            .fetch_optional(&state.db)
            .await?;
    let price = price.ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;

    sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, quantity, unit_price) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, product_id) \
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
    )
    .bind(user_id)
    .bind(body.product_id)
    .bind(body.quantity)
    .bind(price)
    .execute(&state.db)
    .await?;

    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartBody {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdParam>,
    Json(body): Json<UpdateCartBody>,
) -> Result<StatusCode, ApiError> {
    let user_id = params.require()?;
    body.validate().map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .bind(body.quantity)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cart item not found.".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdParam>,
) -> Result<StatusCode, ApiError> {
    let user_id = params.require()?;
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cart item not found.".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<AppState>,
    Query(params): Query<UserIdParam>,
) -> Result<StatusCode, ApiError> {
    let user_id = params.require()?;
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
