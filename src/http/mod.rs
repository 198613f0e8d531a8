//! HTTP surface: application state, router assembly, shared params.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ApiError;
use crate::mail::Mailer;
use crate::notify::Notifier;
use crate::uploads::ImageStore;

pub mod banners;
pub mod bookmarks;
pub mod cart;
pub mod forms;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub notifier: Notifier,
    pub mailer: Option<Mailer>,
    pub images: ImageStore,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> anyhow::Result<Router> {
    let cors = match &state.config.cors_allowed_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .context("CORS_ALLOWED_ORIGIN is not a valid header value")?;
            CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/search", get(products::search))
        .route("/api/products/trending", get(products::trending))
        .route("/api/products/bestsellers", get(products::bestsellers))
        .route("/api/products/award-winners", get(products::award_winners))
        .route("/api/products/new-releases", get(products::new_releases))
        .route("/api/products/new-arrivals", get(products::new_arrivals))
        .route("/api/products/coming-soon", get(products::coming_soon))
        .route("/api/products/deals", get(products::deals))
        .route(
            "/api/products/:id",
            get(products::get_by_id).put(products::update).delete(products::remove),
        )
        .route("/api/cart", get(cart::get_cart).post(cart::add_item).delete(cart::clear))
        .route("/api/cart/:id", put(cart::update_quantity).delete(cart::remove_item))
        .route("/api/orders", post(orders::place).get(orders::list_for_user))
        .route("/api/orders/all", get(orders::list_all))
        .route("/api/orders/:id/cancel", put(orders::cancel))
        .route("/api/orders/process-claim", post(orders::process_claim))
        .route("/api/reviews", post(reviews::add))
        .route("/api/reviews/product/:product_id", get(reviews::for_product))
        .route("/api/bookmarks", get(bookmarks::list).post(bookmarks::add))
        .route("/api/bookmarks/:product_id", delete(bookmarks::remove))
        .route("/api/banners", get(banners::list).post(banners::create))
        .route("/api/banners/active", get(banners::active))
        .route("/api/banners/:id", put(banners::update).delete(banners::remove))
        .route("/api/banners/:id/activate", put(banners::activate))
        .route("/api/notifications/recent", get(notifications::recent))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    Ok(app)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "bookhaven"}))
}

/// `?userId=...` — required by most cart/order/review operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdParam {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl UserIdParam {
    pub fn require(&self) -> Result<&str, ApiError> {
        match self.user_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ApiError::InvalidRequest("UserId is required.".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_param_requires_non_blank() {
        assert!(UserIdParam { user_id: None }.require().is_err());
        assert!(UserIdParam { user_id: Some("  ".into()) }.require().is_err());
        assert_eq!(UserIdParam { user_id: Some(" u1 ".into()) }.require().unwrap(), "u1");
    }
}
