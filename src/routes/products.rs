use axum::{
    Json, Router,
    extract::Path,
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    catalog::{self, Product},
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "The product catalog", body = ProductList)
    ),
    tag = "Products"
)]
pub async fn list_products() -> Json<ProductList> {
    Json(ProductList {
        products: catalog::all().to_vec(),
    })
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = Product),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(Path(id): Path<String>) -> AppResult<Json<Product>> {
    let product = catalog::find(&id).cloned().ok_or(AppError::NotFound)?;
    Ok(Json(product))
}
