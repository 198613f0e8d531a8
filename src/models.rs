//! Database rows and wire DTOs
//!
//! Row structs double as JSON bodies where the shapes line up; DTOs are
//! camelCase because the web front end was built against a camelCase API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::discount;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub language: Option<String>,
    pub format: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub discount_starts_at: Option<DateTime<Utc>>,
    pub discount_ends_at: Option<DateTime<Utc>>,
    pub on_sale: bool,
    pub stock_quantity: i32,
    pub available_in_store: bool,
    pub total_sold: i32,
    pub rating: Decimal,
    pub has_award: bool,
    pub trending: bool,
    pub bestseller: bool,
    pub new_release: bool,
    pub coming_soon: bool,
    pub on_deal: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// List price with any currently running catalog sale applied.
    /// Computed at read time, never stored.
    pub fn final_price_at(&self, now: DateTime<Utc>) -> Decimal {
        discount::sale_price(
            self.price,
            self.discount_percent,
            self.on_sale,
            self.discount_starts_at,
            self.discount_ends_at,
            now,
        )
    }
}

/// A catalog row plus its computed effective price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: Decimal,
}

impl ProductDto {
    pub fn new(product: Product, now: DateTime<Utc>) -> Self {
        let final_price = product.final_price_at(now);
        Self { product, final_price }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedProducts {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<ProductDto>,
}

/// Cart line joined with its catalog row. Prices shown to the customer
/// come from the catalog at read time, not the captured unit price.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub id: i64,
    pub product_id: i64,
    pub product: CartProductDto,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub items: Vec<CartItemDto>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub item_count: i64,
}

impl CartDto {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut subtotal = Decimal::ZERO;
        let mut item_count: i64 = 0;
        let items = lines
            .into_iter()
            .map(|line| {
                let line_subtotal = line.unit_price * Decimal::from(line.quantity);
                subtotal += line_subtotal;
                item_count += i64::from(line.quantity);
                CartItemDto {
                    id: line.id,
                    product_id: line.product_id,
                    product: CartProductDto {
                        id: line.product_id,
                        name: line.product_name,
                        description: line.product_description,
                        price: line.unit_price,
                        image: line.product_image,
                    },
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line_subtotal,
                }
            })
            .collect();
        Self { items, subtotal, total: subtotal, item_count }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: String,
    pub status: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub claim_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    pub user_id: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub claim_code: String,
    pub order_items: Vec<OrderItemDto>,
}

impl OrderDto {
    pub fn new(order: OrderRow, order_items: Vec<OrderItemDto>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            status: order.status,
            created_at: order.created_at,
            claim_code: order.claim_code,
            order_items,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    #[serde(skip)]
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: String,
    pub product_id: i64,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review joined with the product it reviews, for the public listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviewDto {
    pub id: i64,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub product_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDto {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub price: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_product() -> Product {
        Product {
            id: 1,
            name: "The Weight of Ink".into(),
            description: None,
            image_url: None,
            author: Some("Rachel Kadish".into()),
            genre: None,
            publisher: None,
            isbn: None,
            language: None,
            format: None,
            publication_date: None,
            price: Decimal::new(2500, 2),
            discount_percent: Some(Decimal::new(20, 0)),
            discount_starts_at: None,
            discount_ends_at: None,
            on_sale: true,
            stock_quantity: 3,
            available_in_store: true,
            total_sold: 0,
            rating: Decimal::ZERO,
            has_award: false,
            trending: false,
            bestseller: false,
            new_release: false,
            coming_soon: false,
            on_deal: false,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_product_dto_exposes_final_price() {
        let dto = ProductDto::new(sample_product(), Utc::now());
        let json = serde_json::to_value(&dto).unwrap();
        // Flattened row fields plus the computed price, all camelCase.
        assert_eq!(json["finalPrice"], serde_json::json!("20.00"));
        assert_eq!(json["name"], serde_json::json!("The Weight of Ink"));
        assert!(json.get("onSale").is_some());
    }

    #[test]
    fn test_cart_dto_totals() {
        let lines = vec![
            CartLine {
                id: 1,
                product_id: 10,
                product_name: "A".into(),
                product_description: None,
                product_image: None,
                unit_price: Decimal::new(10000, 2),
                quantity: 3,
            },
            CartLine {
                id: 2,
                product_id: 11,
                product_name: "B".into(),
                product_description: None,
                product_image: None,
                unit_price: Decimal::new(5000, 2),
                quantity: 2,
            },
        ];
        let dto = CartDto::from_lines(lines);
        assert_eq!(dto.subtotal, Decimal::new(40000, 2));
        assert_eq!(dto.total, dto.subtotal);
        assert_eq!(dto.item_count, 5);
        assert_eq!(dto.items[0].subtotal, Decimal::new(30000, 2));
    }

    #[test]
    fn test_order_dto_is_camel_case() {
        let order = OrderRow {
            id: 7,
            user_id: "u1".into(),
            status: "Pending".into(),
            total_amount: Decimal::new(34000, 2),
            discount_amount: Decimal::new(6000, 2),
            claim_code: "AB12CD34".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(OrderDto::new(order, vec![])).unwrap();
        assert_eq!(json["totalAmount"], serde_json::json!("340.00"));
        assert_eq!(json["discountAmount"], serde_json::json!("60.00"));
        assert_eq!(json["claimCode"], serde_json::json!("AB12CD34"));
        assert!(json["orderItems"].as_array().unwrap().is_empty());
    }
}
