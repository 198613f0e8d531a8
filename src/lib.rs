//! BookHaven - Bookstore E-commerce Backend
//!
//! REST backend for a bookstore storefront: catalog browsing and search,
//! carts, order placement with a pickup claim-code workflow, loyalty and
//! sale discounts, purchase-gated reviews, bookmarks, and promotional
//! banners. Staff displays receive fulfilment notifications over NATS;
//! customers get their itemized bill and claim code by email.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod mail;
pub mod models;
pub mod notify;
pub mod uploads;
