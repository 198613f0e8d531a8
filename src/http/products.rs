//! Catalog endpoints: paging, search, curated shelves, admin CRUD.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::auth::Admin;
use crate::error::{is_foreign_key_violation, ApiError};
use crate::http::{forms, AppState};
use crate::models::{PaginatedProducts, Product, ProductDto};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedProducts>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(i64::from(limit))
    .bind(i64::from((page - 1) * limit))
    .fetch_all(&state.db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&state.db).await?;

    let now = Utc::now();
    let data = products.into_iter().map(|p| ProductDto::new(p, now)).collect();
    Ok(Json(PaginatedProducts { total, page, limit, data }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub trending: Option<bool>,
    pub bestseller: Option<bool>,
    pub award_winner: Option<bool>,
    pub new_release: Option<bool>,
    pub coming_soon: Option<bool>,
    pub on_deal: Option<bool>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE TRUE");

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = format!("%{q}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(needle.clone())
            .push(" OR description ILIKE ")
            .push_bind(needle.clone())
            .push(" OR author ILIKE ")
            .push_bind(needle.clone())
            .push(" OR genre ILIKE ")
            .push_bind(needle.clone())
            .push(" OR isbn ILIKE ")
            .push_bind(needle)
            .push(")");
    }
    if let Some(min) = params.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = params.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if params.trending == Some(true) {
        qb.push(" AND trending");
    }
    if params.bestseller == Some(true) {
        qb.push(" AND bestseller");
    }
    if params.award_winner == Some(true) {
        qb.push(" AND has_award");
    }
    if params.new_release == Some(true) {
        qb.push(" AND new_release");
    }
    if params.coming_soon == Some(true) {
        qb.push(" AND coming_soon");
    }
    if params.on_deal == Some(true) {
        qb.push(" AND (on_deal OR (on_sale AND discount_percent > 0))");
    }

    qb.push(match params.sort.as_deref() {
        Some("price_asc") => " ORDER BY price ASC",
        Some("price_desc") => " ORDER BY price DESC",
        Some("popularity") => " ORDER BY total_sold DESC",
        Some("newest") => " ORDER BY created_at DESC",
        _ => " ORDER BY name ASC",
    });

    let products = qb.build_query_as::<Product>().fetch_all(&state.db).await?;
    let now = Utc::now();
    Ok(Json(products.into_iter().map(|p| ProductDto::new(p, now)).collect()))
}

async fn shelf(state: &AppState, sql: &str) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let products = sqlx::query_as::<_, Product>(sql).fetch_all(&state.db).await?;
    let now = Utc::now();
    Ok(Json(products.into_iter().map(|p| ProductDto::new(p, now)).collect()))
}

pub async fn trending(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE trending ORDER BY total_sold DESC").await
}

pub async fn bestsellers(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE bestseller ORDER BY total_sold DESC").await
}

pub async fn award_winners(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE has_award ORDER BY name ASC").await
}

pub async fn new_releases(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE new_release ORDER BY publication_date DESC NULLS LAST").await
}

pub async fn new_arrivals(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let cutoff = Utc::now() - Duration::days(30);
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE created_at >= $1 ORDER BY created_at DESC",
    )
    .bind(cutoff)
    .fetch_all(&state.db)
    .await?;
    let now = Utc::now();
    Ok(Json(products.into_iter().map(|p| ProductDto::new(p, now)).collect()))
}

pub async fn coming_soon(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE coming_soon ORDER BY publication_date ASC NULLS LAST").await
}

pub async fn deals(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    shelf(&state, "SELECT * FROM products WHERE on_deal OR (on_sale AND discount_percent > 0) ORDER BY name ASC").await
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;
    Ok(Json(ProductDto::new(product, Utc::now())))
}

/// Multipart product fields; everything arrives as text except `image`.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    author: Option<String>,
    genre: Option<String>,
    publisher: Option<String>,
    isbn: Option<String>,
    language: Option<String>,
    format: Option<String>,
    publication_date: Option<DateTime<Utc>>,
    price: Option<Decimal>,
    discount_percent: Option<Decimal>,
    discount_starts_at: Option<DateTime<Utc>>,
    discount_ends_at: Option<DateTime<Utc>>,
    on_sale: Option<bool>,
    stock_quantity: Option<i32>,
    available_in_store: Option<bool>,
    has_award: Option<bool>,
    trending: Option<bool>,
    bestseller: Option<bool>,
    new_release: Option<bool>,
    coming_soon: Option<bool>,
    on_deal: Option<bool>,
    image: Option<(Option<String>, Bytes)>,
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::InvalidRequest(format!("Invalid multipart payload: {err}"))
}

async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(ToString::to_string) else { continue };
        if name == "image" {
            let file_name = field.file_name().map(ToString::to_string);
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            if !bytes.is_empty() {
                form.image = Some((file_name, bytes));
            }
            continue;
        }
        let value = field.text().await.map_err(bad_multipart)?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "name" => form.name = Some(value.to_string()),
            "description" => form.description = Some(value.to_string()),
            "author" => form.author = Some(value.to_string()),
            "genre" => form.genre = Some(value.to_string()),
            "publisher" => form.publisher = Some(value.to_string()),
            "isbn" => form.isbn = Some(value.to_string()),
            "language" => form.language = Some(value.to_string()),
            "format" => form.format = Some(value.to_string()),
            "publicationDate" => form.publication_date = Some(forms::parse_datetime(&name, value)?),
            "price" => form.price = Some(forms::parse_decimal(&name, value)?),
            "discountPercent" => form.discount_percent = Some(forms::parse_decimal(&name, value)?),
            "discountStartsAt" => form.discount_starts_at = Some(forms::parse_datetime(&name, value)?),
            "discountEndsAt" => form.discount_ends_at = Some(forms::parse_datetime(&name, value)?),
            "onSale" => form.on_sale = Some(forms::parse_bool(&name, value)?),
            "stockQuantity" => form.stock_quantity = Some(forms::parse_i32(&name, value)?),
            "availableInStore" => form.available_in_store = Some(forms::parse_bool(&name, value)?),
            "hasAward" => form.has_award = Some(forms::parse_bool(&name, value)?),
            "trending" => form.trending = Some(forms::parse_bool(&name, value)?),
            "bestseller" => form.bestseller = Some(forms::parse_bool(&name, value)?),
            "newRelease" => form.new_release = Some(forms::parse_bool(&name, value)?),
            "comingSoon" => form.coming_soon = Some(forms::parse_bool(&name, value)?),
            "onDeal" => form.on_deal = Some(forms::parse_bool(&name, value)?),
            _ => {}
        }
    }
    Ok(form)
}

fn validate_pricing(price: Decimal, discount_percent: Option<Decimal>) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::InvalidRequest("price must not be negative.".to_string()));
    }
    if let Some(percent) = discount_percent {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ApiError::InvalidRequest(
                "discountPercent must be between 0 and 100.".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    _admin: Admin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let form = read_product_form(multipart).await?;
    let name = form
        .name
        .ok_or_else(|| ApiError::InvalidRequest("name is required.".to_string()))?;
    let price = form
        .price
        .ok_or_else(|| ApiError::InvalidRequest("price is required.".to_string()))?;
    validate_pricing(price, form.discount_percent)?;
    let (file_name, bytes) = form
        .image
        .ok_or_else(|| ApiError::InvalidRequest("image is required.".to_string()))?;
    let image_url = state.images.save(file_name.as_deref(), &bytes).await?;

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, description, image_url, author, genre, publisher, isbn, \
         language, format, publication_date, price, discount_percent, discount_starts_at, \
         discount_ends_at, on_sale, stock_quantity, available_in_store, has_award, trending, \
         bestseller, new_release, coming_soon, on_deal) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
         $18, $19, $20, $21, $22, $23) RETURNING *",
    )
    .bind(&name)
    .bind(&form.description)
    .bind(&image_url)
    .bind(&form.author)
    .bind(&form.genre)
    .bind(&form.publisher)
    .bind(&form.isbn)
    .bind(&form.language)
    .bind(&form.format)
    .bind(form.publication_date)
    .bind(price)
    .bind(form.discount_percent)
    .bind(form.discount_starts_at)
    .bind(form.discount_ends_at)
    .bind(form.on_sale.unwrap_or(false))
    .bind(form.stock_quantity.unwrap_or(0))
    .bind(form.available_in_store.unwrap_or(true))
    .bind(form.has_award.unwrap_or(false))
    .bind(form.trending.unwrap_or(false))
    .bind(form.bestseller.unwrap_or(false))
    .bind(form.new_release.unwrap_or(false))
    .bind(form.coming_soon.unwrap_or(false))
    .bind(form.on_deal.unwrap_or(false))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ProductDto::new(product, Utc::now()))))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ProductDto>, ApiError> {
    let form = read_product_form(multipart).await?;
    let name = form
        .name
        .ok_or_else(|| ApiError::InvalidRequest("name is required.".to_string()))?;
    let price = form
        .price
        .ok_or_else(|| ApiError::InvalidRequest("price is required.".to_string()))?;
    validate_pricing(price, form.discount_percent)?;

    let image_url = match form.image {
        Some((file_name, bytes)) => Some(state.images.save(file_name.as_deref(), &bytes).await?),
        None => None,
    };

    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, author = $4, genre = $5, \
         publisher = $6, isbn = $7, language = $8, format = $9, publication_date = $10, \
         price = $11, discount_percent = $12, discount_starts_at = $13, discount_ends_at = $14, \
         on_sale = $15, stock_quantity = $16, available_in_store = $17, has_award = $18, \
         trending = $19, bestseller = $20, new_release = $21, coming_soon = $22, on_deal = $23, \
         image_url = COALESCE($24, image_url) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&name)
    .bind(&form.description)
    .bind(&form.author)
    .bind(&form.genre)
    .bind(&form.publisher)
    .bind(&form.isbn)
    .bind(&form.language)
    .bind(&form.format)
    .bind(form.publication_date)
    .bind(price)
    .bind(form.discount_percent)
    .bind(form.discount_starts_at)
    .bind(form.discount_ends_at)
    .bind(form.on_sale.unwrap_or(false))
    .bind(form.stock_quantity.unwrap_or(0))
    .bind(form.available_in_store.unwrap_or(true))
    .bind(form.has_award.unwrap_or(false))
    .bind(form.trending.unwrap_or(false))
    .bind(form.bestseller.unwrap_or(false))
    .bind(form.new_release.unwrap_or(false))
    .bind(form.coming_soon.unwrap_or(false))
    .bind(form.on_deal.unwrap_or(false))
    .bind(image_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;

    Ok(Json(ProductDto::new(product, Utc::now())))
}

pub async fn remove(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::Conflict("Product is referenced by existing orders or carts.".to_string())
            } else {
                e.into()
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product not found.".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
