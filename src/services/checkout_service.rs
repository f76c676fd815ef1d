use crate::{
    dto::checkout::{CheckoutItem, CheckoutRequest, CheckoutSessionDto},
    error::{AppError, AppResult},
    models::LineItem,
    state::AppState,
};

pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 5000;
pub const STANDARD_SHIPPING_CENTS: i64 = 700;

const ALLOWED_COUNTRIES: [&str; 10] = ["US", "CA", "GB", "AU", "DE", "FR", "IT", "ES", "NL", "BE"];

/// Turn the cart into a hosted payment session and hand back its redirect
/// URL. No retry on processor failure; the shopper retries manually.
pub async fn create_session(
    state: &AppState,
    payload: CheckoutRequest,
) -> AppResult<CheckoutSessionDto> {
    validate_items(&payload.items)?;

    let subtotal = subtotal_cents(&payload.items);
    let params = build_session_params(&payload.items, subtotal, &state.app_url)?;

    let session = state
        .stripe
        .create_checkout_session(&params)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "checkout session creation failed");
            AppError::Upstream("Failed to create checkout session".into())
        })?;

    tracing::info!(session_id = %session.id, subtotal_cents = subtotal, "checkout session created");

    Ok(CheckoutSessionDto {
        session_id: session.id,
        url: session.url,
    })
}

pub fn validate_items(items: &[CheckoutItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::BadRequest("No items in cart".into()));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
    }
    Ok(())
}

pub fn subtotal_cents(items: &[CheckoutItem]) -> i64 {
    items
        .iter()
        .map(|i| i.product.price * i64::from(i.quantity))
        .sum()
}

/// Flattened form parameters for `POST /v1/checkout/sessions`.
///
/// `metadata[items]` carries the line-item snapshot; until the webhook
/// fires it is the only record of what was purchased, and the webhook
/// reconstructs the order from it.
pub fn build_session_params(
    items: &[CheckoutItem],
    subtotal_cents: i64,
    app_url: &str,
) -> AppResult<Vec<(String, String)>> {
    let mut params: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        (
            "success_url".into(),
            format!("{app_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
        ),
        ("cancel_url".into(), format!("{app_url}/checkout/cancel")),
    ];

    for (i, item) in items.iter().enumerate() {
        params.push((
            format!("line_items[{i}][price_data][currency]"),
            "usd".into(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.product.name.clone(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][images][0]"),
            format!("{app_url}{}", item.product.package_image),
        ));
        params.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.product.price.to_string(),
        ));
        params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
    }

    for (i, country) in ALLOWED_COUNTRIES.iter().enumerate() {
        params.push((
            format!("shipping_address_collection[allowed_countries][{i}]"),
            (*country).into(),
        ));
    }

    // Two-tier step rule: free at or above the threshold, flat rate below.
    let (shipping_amount, display_name) = if subtotal_cents >= FREE_SHIPPING_THRESHOLD_CENTS {
        (0, "Free Shipping")
    } else {
        (STANDARD_SHIPPING_CENTS, "Standard Shipping")
    };
    let rate = "shipping_options[0][shipping_rate_data]";
    params.push((format!("{rate}[type]"), "fixed_amount".into()));
    params.push((
        format!("{rate}[fixed_amount][amount]"),
        shipping_amount.to_string(),
    ));
    params.push((format!("{rate}[fixed_amount][currency]"), "usd".into()));
    params.push((format!("{rate}[display_name]"), display_name.into()));
    params.push((
        format!("{rate}[delivery_estimate][minimum][unit]"),
        "business_day".into(),
    ));
    params.push((format!("{rate}[delivery_estimate][minimum][value]"), "5".into()));
    params.push((
        format!("{rate}[delivery_estimate][maximum][unit]"),
        "business_day".into(),
    ));
    params.push((format!("{rate}[delivery_estimate][maximum][value]"), "7".into()));

    let snapshot: Vec<LineItem> = items
        .iter()
        .map(|item| LineItem {
            id: item.product.id.clone(),
            name: item.product.name.clone(),
            price: item.product.price,
            quantity: item.quantity,
        })
        .collect();
    let snapshot_json = serde_json::to_string(&snapshot).map_err(anyhow::Error::from)?;
    params.push(("metadata[items]".into(), snapshot_json));

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::checkout::CheckoutProduct;

    fn item(id: &str, name: &str, price: i64, quantity: i32) -> CheckoutItem {
        CheckoutItem {
            product: CheckoutProduct {
                id: id.into(),
                name: name.into(),
                price,
                package_image: format!("/images/products/{id}.png"),
            },
            quantity,
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn rejects_empty_cart_and_bad_quantities() {
        assert!(matches!(
            validate_items(&[]),
            Err(crate::error::AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_items(&[item("classic-granola", "Classic Granola", 1200, 0)]),
            Err(crate::error::AppError::BadRequest(_))
        ));
        assert!(validate_items(&[item("classic-granola", "Classic Granola", 1200, 1)]).is_ok());
    }

    #[test]
    fn free_shipping_at_and_above_threshold() {
        // 12.00 x2 + 30.00 x1 = 54.00, above the 50.00 threshold
        let items = vec![
            item("classic-granola", "Classic Granola", 1200, 2),
            item("cacao-balls", "Cacao Energy Balls", 3000, 1),
        ];
        let subtotal = subtotal_cents(&items);
        assert_eq!(subtotal, 5400);

        let params = build_session_params(&items, subtotal, "https://store.example.com").unwrap();
        let rate = "shipping_options[0][shipping_rate_data]";
        assert_eq!(param(&params, &format!("{rate}[fixed_amount][amount]")), Some("0"));
        assert_eq!(param(&params, &format!("{rate}[display_name]")), Some("Free Shipping"));
    }

    #[test]
    fn standard_rate_below_threshold() {
        let items = vec![item("peanut-balls", "Peanut Energy Balls", 900, 1)];
        let subtotal = subtotal_cents(&items);
        let params = build_session_params(&items, subtotal, "https://store.example.com").unwrap();
        let rate = "shipping_options[0][shipping_rate_data]";
        assert_eq!(param(&params, &format!("{rate}[fixed_amount][amount]")), Some("700"));
        assert_eq!(
            param(&params, &format!("{rate}[display_name]")),
            Some("Standard Shipping")
        );
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let exactly = vec![item("classic-granola", "Classic Granola", 5000, 1)];
        let params = build_session_params(&exactly, 5000, "https://s.example.com").unwrap();
        let rate = "shipping_options[0][shipping_rate_data]";
        assert_eq!(param(&params, &format!("{rate}[fixed_amount][amount]")), Some("0"));

        let just_under = vec![item("classic-granola", "Classic Granola", 4999, 1)];
        let params = build_session_params(&just_under, 4999, "https://s.example.com").unwrap();
        assert_eq!(param(&params, &format!("{rate}[fixed_amount][amount]")), Some("700"));
    }

    #[test]
    fn line_items_use_minor_units_and_absolute_images() {
        let items = vec![item("classic-granola", "Classic Granola", 1200, 2)];
        let params = build_session_params(&items, 2400, "https://store.example.com").unwrap();

        assert_eq!(
            param(&params, "line_items[0][price_data][unit_amount]"),
            Some("1200")
        );
        assert_eq!(param(&params, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            param(&params, "line_items[0][price_data][product_data][images][0]"),
            Some("https://store.example.com/images/products/classic-granola.png")
        );
        assert_eq!(
            param(&params, "success_url"),
            Some("https://store.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[test]
    fn metadata_snapshot_roundtrips_into_line_items() {
        let items = vec![
            item("classic-granola", "Classic Granola", 1200, 2),
            item("cacao-balls", "Cacao Energy Balls", 3000, 1),
        ];
        let params = build_session_params(&items, 5400, "https://s.example.com").unwrap();
        let raw = param(&params, "metadata[items]").unwrap();

        let snapshot: Vec<LineItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "classic-granola");
        assert_eq!(snapshot[0].price, 1200);
        assert_eq!(snapshot[0].quantity, 2);
        let snapshot_subtotal: i64 = snapshot
            .iter()
            .map(|i| i.price * i64::from(i.quantity))
            .sum();
        assert_eq!(snapshot_subtotal, 5400);
    }
}
