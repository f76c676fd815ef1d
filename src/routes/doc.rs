use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::{Product, ProductKind},
    dto::{
        checkout::{CheckoutItem, CheckoutProduct, CheckoutRequest, CheckoutSessionDto},
        orders::{OrderListResponse, OrderResponse, OrderSummaryResponse, UpdateOrderRequest},
    },
    models::{LineItem, Order, OrderStatus, OrderSummary, PostalAddress},
    routes::{admin, checkout, health, orders, products, webhook},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("Secret")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        checkout::create_checkout_session,
        webhook::stripe_webhook,
        orders::get_order_by_session,
        admin::list_all_orders,
        admin::update_order,
    ),
    components(
        schemas(
            Product,
            ProductKind,
            products::ProductList,
            CheckoutRequest,
            CheckoutItem,
            CheckoutProduct,
            CheckoutSessionDto,
            Order,
            OrderStatus,
            OrderSummary,
            LineItem,
            PostalAddress,
            OrderListResponse,
            OrderResponse,
            OrderSummaryResponse,
            UpdateOrderRequest,
            webhook::WebhookAck,
            health::HealthData,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Static product catalog"),
        (name = "Checkout", description = "Hosted payment session creation"),
        (name = "Webhook", description = "Payment processor callbacks"),
        (name = "Orders", description = "Customer-facing order lookup"),
        (name = "Admin", description = "Order fulfillment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
