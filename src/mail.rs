//! Order bill email
//!
//! Sends the itemized bill and claim code after checkout. Delivery is
//! fire-and-forget relative to the request: callers spawn the send and
//! log failures without surfacing them.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rust_decimal::Decimal;

use crate::config::SmtpConfig;
use crate::models::OrderDto;

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();
        Ok(Self { transport, from: config.from })
    }

    pub async fn send_order_bill(&self, to: &str, order: &OrderDto) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(format!("Your Claim Code & Bill for order #{}", order.id))
            .header(ContentType::TEXT_HTML)
            .body(order_bill_html(order))?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Renders the bill: one row per item, then subtotal, discount, and the
/// amount due, with the claim code called out up top.
pub fn order_bill_html(order: &OrderDto) -> String {
    let item_rows: String = order
        .order_items
        .iter()
        .map(|item| {
            let line_total = item.unit_price * Decimal::from(item.quantity);
            format!(
                "<tr><td>{}</td><td>{}</td><td>Rs. {:.2}</td><td>Rs. {:.2}</td></tr>",
                item.product_name, item.quantity, item.unit_price, line_total
            )
        })
        .collect();

    let subtotal = order.total_amount + order.discount_amount;

    format!(
        "<html><body>\
         <h2>Thanks for your order #{id}!</h2>\
         <p>Your claim code: <strong>{claim}</strong></p>\
         <h3>Order Bill:</h3>\
         <table border='1' cellpadding='5' cellspacing='0'>\
         <tr><th>Book</th><th>Qty</th><th>Unit Price</th><th>Subtotal</th></tr>\
         {rows}\
         <tr><td colspan='3' align='right'><strong>Subtotal:</strong></td><td>Rs. {subtotal:.2}</td></tr>\
         <tr><td colspan='3' align='right'><strong>Discount:</strong></td><td>- Rs. {discount:.2}</td></tr>\
         <tr><td colspan='3' align='right'><strong>Total:</strong></td><td><strong>Rs. {total:.2}</strong></td></tr>\
         </table>\
         <p>Please present this claim code at the counter to pick up your order.</p>\
         <p>Regards,<br>The BookHaven Team</p>\
         </body></html>",
        id = order.id,
        claim = order.claim_code,
        rows = item_rows,
        subtotal = subtotal,
        discount = order.discount_amount,
        total = order.total_amount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItemDto, OrderRow};
    use chrono::Utc;

    fn sample_order() -> OrderDto {
        let row = OrderRow {
            id: 42,
            user_id: "u1".into(),
            status: "Pending".into(),
            total_amount: Decimal::new(34000, 2),
            discount_amount: Decimal::new(6000, 2),
            claim_code: "AB12CD34".into(),
            created_at: Utc::now(),
        };
        let items = vec![
            OrderItemDto {
                order_id: 42,
                product_id: 1,
                product_name: "Dune".into(),
                unit_price: Decimal::new(10000, 2),
                quantity: 3,
            },
            OrderItemDto {
                order_id: 42,
                product_id: 2,
                product_name: "Persuasion".into(),
                unit_price: Decimal::new(5000, 2),
                quantity: 2,
            },
        ];
        OrderDto::new(row, items)
    }

    #[test]
    fn test_bill_contains_claim_code_and_items() {
        let html = order_bill_html(&sample_order());
        assert!(html.contains("AB12CD34"));
        assert!(html.contains("Dune"));
        assert!(html.contains("Persuasion"));
        assert!(html.contains("order #42"));
    }

    #[test]
    fn test_bill_totals_reconcile() {
        let html = order_bill_html(&sample_order());
        // subtotal = total + discount = 340 + 60
        assert!(html.contains("Rs. 400.00"));
        assert!(html.contains("- Rs. 60.00"));
        assert!(html.contains("Rs. 340.00"));
    }

    #[test]
    fn test_bill_line_totals() {
        let html = order_bill_html(&sample_order());
        assert!(html.contains("Rs. 300.00")); // 3 x 100.00
        assert!(html.contains("Rs. 100.00")); // unit price row
    }
}
