//! Order workflow: placement, cancellation, claim fulfilment, projections.
//!
//! Placement consumes the cart and creates the order in one transaction;
//! the cart is never partially consumed. The claim-code unique constraint
//! backs code generation, and a collision retries the whole transaction.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::{AuthUser, Staff};
use crate::domain::order::OrderStatus;
use crate::domain::{claim, discount, order};
use crate::error::{violates_constraint, ApiError};
use crate::http::{AppState, UserIdParam};
use crate::models::{OrderDto, OrderItemDto, OrderRow};

/// Attempts before giving up on finding an unused claim code.
const CLAIM_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CheckoutLine {
    product_id: i64,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

pub async fn place(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<UserIdParam>,
) -> Result<(StatusCode, Json<OrderDto>), ApiError> {
    let user_id = params.require()?;

    let lines = sqlx::query_as::<_, CheckoutLine>(
        "SELECT ci.product_id, p.name AS product_name, p.price AS unit_price, ci.quantity \
         FROM cart_items ci JOIN products p ON p.id = ci.product_id \
         WHERE ci.user_id = $1 ORDER BY ci.added_at",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    if lines.is_empty() {
        return Err(ApiError::InvalidRequest("Cart is empty.".to_string()));
    }

    let completed_orders: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status = 'Completed'",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    let quote = discount::loyalty_quote(
        lines.iter().map(|line| (line.unit_price, line.quantity)),
        completed_orders,
    );

    // Insert the order, its items, and the cart deletion as one unit. A
    // claim-code collision aborts the transaction, so the retry restarts
    // it from scratch with a fresh code.
    let mut placed: Option<OrderRow> = None;
    for _ in 0..CLAIM_CODE_ATTEMPTS {
        let claim_code = claim::generate();
        let mut tx = state.db.begin().await?;

        let inserted = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (user_id, status, total_amount, discount_amount, claim_code) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(quote.final_total)
        .bind(quote.discount_amount)
        .bind(&claim_code)
        .fetch_one(&mut *tx)
        .await;

        let order = match inserted {
            Ok(order) => order,
            Err(e) if violates_constraint(&e, "orders_claim_code_key") => {
                tracing::warn!("claim code collision, regenerating");
                tx.rollback().await.ok();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for line in &lines {
            let line_total = line.unit_price * Decimal::from(line.quantity);
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, unit_price, quantity, \
                 discount_amount, final_price) VALUES ($1, $2, $3, $4, 0, $5)",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        placed = Some(order);
        break;
    }
    let order = placed
        .ok_or_else(|| ApiError::Internal("Could not allocate a unique claim code.".to_string()))?;

    let order_items = lines
        .iter()
        .map(|line| OrderItemDto {
            order_id: order.id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();
    let dto = OrderDto::new(order, order_items);

    // Best-effort bill email; never blocks or fails the order.
    match (state.mailer.clone(), user.0.email.clone()) {
        (Some(mailer), Some(email)) => {
            let bill = dto.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer.send_order_bill(&email, &bill).await {
                    tracing::warn!(error = %e, order_id = bill.id, "failed to send order bill");
                }
            });
        }
        _ => tracing::info!(order_id = dto.id, "no mailer or email claim, skipping order bill"),
    }

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn items_for(state: &AppState, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderItemDto>>, ApiError> {
    let items = sqlx::query_as::<_, OrderItemDto>(
        "SELECT oi.order_id, oi.product_id, p.name AS product_name, oi.unit_price, oi.quantity \
         FROM order_items oi JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = ANY($1) ORDER BY oi.id",
    )
    .bind(order_ids)
    .fetch_all(&state.db)
    .await?;

    let mut by_order: HashMap<i64, Vec<OrderItemDto>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(by_order)
}

fn assemble(orders: Vec<OrderRow>, mut items: HashMap<i64, Vec<OrderItemDto>>) -> Vec<OrderDto> {
    orders
        .into_iter()
        .map(|order| {
            let order_items = items.remove(&order.id).unwrap_or_default();
            OrderDto::new(order, order_items)
        })
        .collect()
}

pub async fn list_for_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<UserIdParam>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let user_id = params.require()?;
    let orders = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let items = items_for(&state, &ids).await?;
    Ok(Json(assemble(orders, items)))
}

pub async fn list_all(
    State(state): State<AppState>,
    _staff: Staff,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let orders = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let items = items_for(&state, &ids).await?;
    Ok(Json(assemble(orders, items)))
}

pub async fn cancel(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<UserIdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = params.require()?;

    let order = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let status = order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !status.is_cancellable() {
        return Err(ApiError::InvalidState("Order cannot be cancelled at this stage.".to_string()));
    }

    // Conditional update: if staff completed the order since the read
    // above, the cancellation loses.
    let result = sqlx::query(
        "UPDATE orders SET status = $2 WHERE id = $1 AND status IN ('Pending', 'Processing')",
    )
    .bind(order.id)
    .bind(OrderStatus::Cancelled.as_str())
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidState("Order cannot be cancelled at this stage.".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Order cancelled successfully." })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimParams {
    #[serde(default)]
    pub claim_code: Option<String>,
}

pub async fn process_claim(
    State(state): State<AppState>,
    _staff: Staff,
    Query(params): Query<ClaimParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claim_code = match params.claim_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return Err(ApiError::InvalidRequest("Claim code is required.".to_string())),
    };
    if !claim::is_well_formed(claim_code) {
        return Err(ApiError::NotFound("Invalid claim code. Order not found.".to_string()));
    }

    let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE claim_code = $1")
        .bind(claim_code)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid claim code. Order not found.".to_string()))?;

    let status = order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    order::check_fulfillable(status).map_err(|e| ApiError::InvalidState(e.to_string()))?;

    let result = sqlx::query(
        "UPDATE orders SET status = $2 WHERE id = $1 AND status IN ('Pending', 'Processing')",
    )
    .bind(order.id)
    .bind(OrderStatus::Completed.as_str())
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        // Lost a race with a concurrent transition; report the state we lost to.
        let current: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(order.id)
            .fetch_one(&state.db)
            .await?;
        let current = current.parse::<OrderStatus>().map_err(|e| ApiError::Internal(e.to_string()))?;
        return match order::check_fulfillable(current) {
            Err(e) => Err(ApiError::InvalidState(e.to_string())),
            Ok(()) => Err(ApiError::Internal("Order status changed concurrently.".to_string())),
        };
    }

    let book_count: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM order_items WHERE order_id = $1",
    )
    .bind(order.id)
    .fetch_one(&state.db)
    .await?;

    // Broadcast failure is logged inside the notifier and never affects
    // the completed transition.
    state
        .notifier
        .broadcast(format!("A customer just bought {book_count} books!"))
        .await;

    Ok(Json(serde_json::json!({
        "message": format!("Order #{} marked as Completed.", order.id)
    })))
}
