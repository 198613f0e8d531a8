//! Promotional banners
//!
//! Multiple banners with an exclusive active flag and an optional time
//! window. The partial unique index on `is_active` makes "at most one
//! active" a database invariant; activation swaps flags inside one
//! transaction.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};

use crate::auth::Admin;
use crate::error::ApiError;
use crate::http::{forms, AppState};
use crate::models::Banner;

pub async fn list(State(state): State<AppState>, _admin: Admin) -> Result<Json<Vec<Banner>>, ApiError> {
    let banners = sqlx::query_as::<_, Banner>("SELECT * FROM banners ORDER BY updated_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(banners))
}

pub async fn active(State(state): State<AppState>) -> Result<Json<Banner>, ApiError> {
    let banner = sqlx::query_as::<_, Banner>(
        "SELECT * FROM banners WHERE is_active \
         AND (starts_at IS NULL OR starts_at <= NOW()) \
         AND (ends_at IS NULL OR ends_at >= NOW())",
    )
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("No active banner at this time.".to_string()))?;
    Ok(Json(banner))
}

#[derive(Debug, Default)]
struct BannerForm {
    title: Option<String>,
    subtitle: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    image: Option<(Option<String>, Bytes)>,
}

async fn read_banner_form(mut multipart: Multipart) -> Result<BannerForm, ApiError> {
    let mut form = BannerForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart payload: {e}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else { continue };
        if name == "image" {
            let file_name = field.file_name().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart payload: {e}")))?;
            if !bytes.is_empty() {
                form.image = Some((file_name, bytes));
            }
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart payload: {e}")))?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "title" => form.title = Some(value.to_string()),
            "subtitle" => form.subtitle = Some(value.to_string()),
            "startsAt" => form.starts_at = Some(forms::parse_datetime(&name, value)?),
            "endsAt" => form.ends_at = Some(forms::parse_datetime(&name, value)?),
            _ => {}
        }
    }
    Ok(form)
}

pub async fn create(
    State(state): State<AppState>,
    _admin: Admin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Banner>), ApiError> {
    let form = read_banner_form(multipart).await?;
    let title = form
        .title
        .ok_or_else(|| ApiError::InvalidRequest("title is required.".to_string()))?;

    let image_url = match form.image {
        Some((file_name, bytes)) => Some(state.images.save(file_name.as_deref(), &bytes).await?),
        None => None,
    };

    // New banners start inactive; activation is an explicit step.
    let banner = sqlx::query_as::<_, Banner>(
        "INSERT INTO banners (title, subtitle, image_url, is_active, starts_at, ends_at) \
         VALUES ($1, $2, $3, FALSE, $4, $5) RETURNING *",
    )
    .bind(&title)
    .bind(&form.subtitle)
    .bind(&image_url)
    .bind(form.starts_at)
    .bind(form.ends_at)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(banner)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Banner>, ApiError> {
    let form = read_banner_form(multipart).await?;
    let title = form
        .title
        .ok_or_else(|| ApiError::InvalidRequest("title is required.".to_string()))?;

    let image_url = match form.image {
        Some((file_name, bytes)) => Some(state.images.save(file_name.as_deref(), &bytes).await?),
        None => None,
    };

    let banner = sqlx::query_as::<_, Banner>(
        "UPDATE banners SET title = $2, subtitle = $3, starts_at = $4, ends_at = $5, \
         image_url = COALESCE($6, image_url), updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&title)
    .bind(&form.subtitle)
    .bind(form.starts_at)
    .bind(form.ends_at)
    .bind(image_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Banner not found.".to_string()))?;

    Ok(Json(banner))
}

pub async fn activate(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut tx = state.db.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM banners WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(ApiError::NotFound("Banner not found.".to_string()));
    }

    // Clear-then-set keeps the partial unique index satisfied at every
    // statement boundary.
    sqlx::query("UPDATE banners SET is_active = FALSE WHERE is_active")
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE banners SET is_active = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Json(serde_json::json!({ "message": format!("Banner {id} is now active.") })))
}

pub async fn remove(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM banners WHERE id = $1").bind(id).execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Banner not found.".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Banner deleted." })))
}
