//! Bookmarks ("save for later").

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{is_unique_violation, ApiError};
use crate::http::{AppState, UserIdParam};
use crate::models::BookmarkDto;

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<UserIdParam>,
) -> Result<Json<Vec<BookmarkDto>>, ApiError> {
    let user_id = params.require()?;
    let bookmarks = sqlx::query_as::<_, BookmarkDto>(
        "SELECT b.id, b.product_id, p.name AS product_name, p.image_url AS product_image, \
         p.price, b.added_at \
         FROM bookmarks b JOIN products p ON p.id = b.product_id \
         WHERE b.user_id = $1 ORDER BY b.added_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(bookmarks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookmarkBody {
    pub product_id: i64,
}

pub async fn add(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<UserIdParam>,
    Json(body): Json<AddBookmarkBody>,
) -> Result<(StatusCode, Json<BookmarkDto>), ApiError> {
    let user_id = params.require()?;
    if body.product_id <= 0 {
        return Err(ApiError::InvalidRequest("ProductId is required.".to_string()));
    }

    let product: Option<(String, Option<String>, Decimal)> =
        sqlx::query_as("SELECT name, image_url, price FROM products WHERE id = $1")
            .bind(body.product_id)
            .fetch_optional(&state.db)
            .await?;
    let (product_name, product_image, price) =
        product.ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;

    let inserted: (i64, DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO bookmarks (user_id, product_id) VALUES ($1, $2) RETURNING id, added_at",
    )
    .bind(user_id)
    .bind(body.product_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Bookmark already exists.".to_string())
        } else {
            e.into()
        }
    })?;

    let dto = BookmarkDto {
        id: inserted.0,
        product_id: body.product_id,
        product_name,
        product_image,
        price,
        added_at: inserted.1,
    };
    Ok((StatusCode::CREATED, Json(dto)))
}

pub async fn remove(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(product_id): Path<i64>,
    Query(params): Query<UserIdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = params.require()?;
    let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Bookmark not found.".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Bookmark removed." })))
}
