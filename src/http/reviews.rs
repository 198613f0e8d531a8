//! Reviews, gated by purchase history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{is_unique_violation, ApiError};
use crate::http::AppState;
use crate::models::{ProductReviewDto, Review};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewBody {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

pub async fn add(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ReviewParams>,
    Json(body): Json<ReviewBody>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let user_id = match params.user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return Err(ApiError::InvalidRequest("UserId is required.".to_string())),
    };
    let product_id = match params.product_id {
        Some(id) if id > 0 => id,
        _ => return Err(ApiError::InvalidRequest("ProductId is required.".to_string())),
    };
    body.validate().map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let has_completed_order: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM orders o \
         JOIN order_items oi ON oi.order_id = o.id \
         WHERE o.user_id = $1 AND o.status = 'Completed' AND oi.product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&state.db)
    .await?;
    if !has_completed_order {
        return Err(ApiError::Forbidden(
            "You can only review a product you purchased and completed.".to_string(),
        ));
    }

    let already_reviewed: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&state.db)
    .await?;
    if already_reviewed {
        return Err(ApiError::Conflict(
            "You have already submitted a review for this product.".to_string(),
        ));
    }

    // The unique constraint closes the race between the check above and
    // this insert.
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (user_id, product_id, rating, comment) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(body.rating)
    .bind(&body.comment)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("You have already submitted a review for this product.".to_string())
        } else {
            e.into()
        }
    })?;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn for_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<ProductReviewDto>>, ApiError> {
    let reviews = sqlx::query_as::<_, ProductReviewDto>(
        "SELECT r.id, r.user_id, r.rating, r.comment, r.created_at, \
         p.name AS product_name, p.image_url AS product_image \
         FROM reviews r JOIN products p ON p.id = r.product_id \
         WHERE r.product_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(product_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}
