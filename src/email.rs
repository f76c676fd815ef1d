//! Transactional order emails over the Resend HTTP API.
//!
//! Three fixed templates, each rendered from the persisted order. Sending is
//! best-effort: callers log failures and move on, delivery is never tied to
//! order correctness.

use anyhow::Result;
use serde::Serialize;

use crate::models::Order;

const RESEND_API_BASE: &str = "https://api.resend.com";

pub fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_key: String,
    from: String,
    app_url: String,
    base_url: String,
}

impl EmailClient {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            app_url: app_url.into(),
            base_url: RESEND_API_BASE.to_string(),
        }
    }

    /// Point the client at a different delivery host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn send_order_confirmed(&self, order: &Order) -> Result<()> {
        let subject = format!("Order Confirmed! {}", order.order_number);
        let html = render_confirmed(order);
        self.send(&order.customer_email, &subject, &html).await
    }

    pub async fn send_order_shipped(&self, order: &Order) -> Result<()> {
        let subject = format!("Your Order Has Shipped! {}", order.order_number);
        let html = render_shipped(order);
        self.send(&order.customer_email, &subject, &html).await
    }

    pub async fn send_order_delivered(&self, order: &Order) -> Result<()> {
        let subject = format!("Your Order Has Been Delivered! {}", order.order_number);
        let html = render_delivered(order, &self.app_url);
        self.send(&order.customer_email, &subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        self.http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn wrap(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Your order</title></head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #fafafa; margin: 0; padding: 24px;">
  <table width="100%" cellpadding="0" cellspacing="0" style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 12px; overflow: hidden;">
{content}
    <tr>
      <td style="padding: 24px 32px; border-top: 1px solid #e2e8f0; color: #94a3b8; font-size: 12px; text-align: center;">
        This email was sent automatically. Please do not reply.
      </td>
    </tr>
  </table>
</body>
</html>"#
    )
}

fn order_number_box(order: &Order) -> String {
    format!(
        r#"    <tr>
      <td style="padding: 0 32px 24px;">
        <p style="color: #64748b; margin: 0 0 4px; font-size: 11px; text-transform: uppercase; letter-spacing: 1px;">Order Number</p>
        <p style="color: #1e293b; margin: 0; font-size: 20px; font-weight: 700;">{}</p>
      </td>
    </tr>
"#,
        order.order_number
    )
}

fn render_confirmed(order: &Order) -> String {
    let items_rows: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                r#"          <tr>
            <td style="padding: 8px 0; color: #1e293b;">{} <span style="color: #64748b;">x{}</span></td>
            <td align="right" style="padding: 8px 0; color: #1e293b; font-weight: 600;">{}</td>
          </tr>
"#,
                item.name,
                item.quantity,
                format_cents(item.price * i64::from(item.quantity))
            )
        })
        .collect();

    let shipping_label = if order.shipping_cents == 0 {
        "FREE".to_string()
    } else {
        format_cents(order.shipping_cents)
    };

    let content = format!(
        r#"    <tr>
      <td style="background: #2d5016; padding: 32px; text-align: center;">
        <h1 style="color: #ffffff; margin: 0; font-size: 24px;">Order Confirmed!</h1>
      </td>
    </tr>
    <tr>
      <td style="padding: 32px;">
        <p style="color: #64748b; margin: 0;">Hi <strong style="color: #1e293b;">{name}</strong>, thank you for your order! We're preparing it with care and will ship it soon.</p>
      </td>
    </tr>
{number_box}    <tr>
      <td style="padding: 0 32px 32px;">
        <table width="100%" cellpadding="0" cellspacing="0" style="border-top: 2px solid #1e293b;">
{items_rows}          <tr>
            <td style="padding: 12px 0 4px; color: #64748b;">Subtotal</td>
            <td align="right" style="padding: 12px 0 4px; color: #1e293b;">{subtotal}</td>
          </tr>
          <tr>
            <td style="padding: 4px 0; color: #64748b;">Shipping</td>
            <td align="right" style="padding: 4px 0; color: #1e293b;">{shipping}</td>
          </tr>
          <tr>
            <td style="padding: 12px 0 0; color: #1e293b; font-size: 18px; font-weight: 700;">Total</td>
            <td align="right" style="padding: 12px 0 0; color: #1e293b; font-size: 18px; font-weight: 700;">{total}</td>
          </tr>
        </table>
      </td>
    </tr>
    <tr>
      <td style="padding: 0 32px 32px; text-align: center; color: #92400e; font-size: 14px;">
        We'll send you another email when your order ships!
      </td>
    </tr>
"#,
        name = order.customer_name,
        number_box = order_number_box(order),
        items_rows = items_rows,
        subtotal = format_cents(order.subtotal_cents),
        shipping = shipping_label,
        total = format_cents(order.total_cents),
    );

    wrap(&content)
}

fn render_shipped(order: &Order) -> String {
    let tracking_section = match &order.tracking_number {
        Some(tracking) => format!(
            r#"    <tr>
      <td style="padding: 0 32px 24px;">
        <p style="color: #3b82f6; margin: 0 0 4px; font-size: 11px; text-transform: uppercase; letter-spacing: 1px;">Tracking Number</p>
        <p style="color: #1e293b; margin: 0; font-size: 20px; font-weight: 700; font-family: monospace;">{tracking}</p>
      </td>
    </tr>
"#
        ),
        None => String::new(),
    };

    let address_section = match &order.shipping_address {
        Some(address) => {
            let line2 = address
                .line2
                .as_deref()
                .map(|l| format!("{l}<br>"))
                .unwrap_or_default();
            format!(
                r#"    <tr>
      <td style="padding: 0 32px 24px;">
        <p style="color: #1e293b; margin: 0 0 8px; font-size: 13px; text-transform: uppercase; letter-spacing: 0.5px; font-weight: 600;">Shipping To</p>
        <p style="color: #64748b; margin: 0; font-size: 14px; line-height: 1.7;">
          {line1}<br>
          {line2}{city}, {state} {postal_code}<br>
          {country}
        </p>
      </td>
    </tr>
"#,
                line1 = address.line1,
                line2 = line2,
                city = address.city,
                state = address.state,
                postal_code = address.postal_code,
                country = address.country,
            )
        }
        None => String::new(),
    };

    let content = format!(
        r#"    <tr>
      <td style="background: #1d4ed8; padding: 32px; text-align: center;">
        <h1 style="color: #ffffff; margin: 0; font-size: 24px;">Your Order Has Shipped!</h1>
      </td>
    </tr>
    <tr>
      <td style="padding: 32px;">
        <p style="color: #64748b; margin: 0;">Great news, <strong style="color: #1e293b;">{name}</strong>! Your order is on its way to you.</p>
      </td>
    </tr>
{number_box}{tracking_section}{address_section}    <tr>
      <td style="padding: 0 32px 32px; text-align: center; color: #065f46; font-size: 14px;">
        Estimated delivery: <strong>5-7 business days</strong>
      </td>
    </tr>
"#,
        name = order.customer_name,
        number_box = order_number_box(order),
        tracking_section = tracking_section,
        address_section = address_section,
    );

    wrap(&content)
}

fn render_delivered(order: &Order, app_url: &str) -> String {
    let content = format!(
        r#"    <tr>
      <td style="background: #a86b68; padding: 32px; text-align: center;">
        <h1 style="color: #ffffff; margin: 0; font-size: 24px;">Your Order Has Arrived!</h1>
      </td>
    </tr>
    <tr>
      <td style="padding: 32px; text-align: center;">
        <p style="color: #64748b; margin: 0;">Hi <strong style="color: #1e293b;">{name}</strong>, your order has been delivered! We hope you love your snacks.</p>
      </td>
    </tr>
{number_box}    <tr>
      <td style="padding: 0 32px 32px; text-align: center;">
        <a href="{app_url}/shop" style="background: #2d5016; color: #ffffff; text-decoration: none; font-size: 15px; font-weight: 600; padding: 14px 36px; border-radius: 50px; display: inline-block;">Shop Again</a>
      </td>
    </tr>
"#,
        name = order.customer_name,
        number_box = order_number_box(order),
        app_url = app_url,
    );

    wrap(&content)
}
