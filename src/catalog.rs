use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Granola,
    Balls,
    Dessert,
}

/// A catalog product. `price_cents` is the unit price in USD minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub price_cents: i64,
    pub description: String,
    pub protein: String,
    pub ingredients: Vec<String>,
    pub package_image: String,
    pub bg_color: String,
    pub accent_color: String,
    pub badge_color: String,
    pub no_added_sugar: bool,
}

fn product(
    id: &str,
    name: &str,
    kind: ProductKind,
    price_cents: i64,
    description: &str,
    protein: &str,
    ingredients: &[&str],
    package_image: &str,
    bg_color: &str,
    accent_color: &str,
    badge_color: &str,
    no_added_sugar: bool,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        price_cents,
        description: description.to_string(),
        protein: protein.to_string(),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        package_image: package_image.to_string(),
        bg_color: bg_color.to_string(),
        accent_color: accent_color.to_string(),
        badge_color: badge_color.to_string(),
        no_added_sugar,
    }
}

// The catalog is fixed data, loaded once and never mutated.
static CATALOG: LazyLock<Vec<Product>> = LazyLock::new(|| {
    vec![
        product(
            "classic-granola",
            "Classic Granola",
            ProductKind::Granola,
            1200,
            "Slow-baked oat granola with almonds and a touch of honey.",
            "9g",
            &["rolled oats", "almonds", "honey", "coconut oil", "sea salt"],
            "/images/products/classic-granola.png",
            "#f5efe0",
            "#2d5016",
            "#8aa86b",
            false,
        ),
        product(
            "cacao-granola",
            "Cacao Granola",
            ProductKind::Granola,
            1300,
            "Dark cacao granola with hazelnuts and cocoa nibs.",
            "10g",
            &["rolled oats", "hazelnuts", "cacao", "cocoa nibs", "maple syrup"],
            "/images/products/cacao-granola.png",
            "#ece2d8",
            "#4a2c17",
            "#a86b68",
            false,
        ),
        product(
            "peanut-balls",
            "Peanut Energy Balls",
            ProductKind::Balls,
            900,
            "Date-based energy balls rolled in crushed peanuts.",
            "7g",
            &["dates", "peanuts", "oats", "chia seeds"],
            "/images/products/peanut-balls.png",
            "#f7e8d4",
            "#7a4f1d",
            "#d9a441",
            true,
        ),
        product(
            "cacao-balls",
            "Cacao Energy Balls",
            ProductKind::Balls,
            900,
            "Cacao and date energy balls with a soft fudge bite.",
            "6g",
            &["dates", "cacao", "cashews", "coconut"],
            "/images/products/cacao-balls.png",
            "#efe0e0",
            "#3d2314",
            "#c5807d",
            true,
        ),
        product(
            "apple-crumble",
            "Apple Crumble Cup",
            ProductKind::Dessert,
            1100,
            "Baked apple dessert cup with a granola crumble topping.",
            "5g",
            &["apples", "rolled oats", "cinnamon", "butter", "brown sugar"],
            "/images/products/apple-crumble.png",
            "#f3ead9",
            "#9a3412",
            "#e0b089",
            false,
        ),
        product(
            "berry-parfait",
            "Berry Parfait Cup",
            ProductKind::Dessert,
            1250,
            "Layered berry compote and yogurt dessert cup.",
            "8g",
            &["strawberries", "blueberries", "yogurt", "granola"],
            "/images/products/berry-parfait.png",
            "#f0e4ec",
            "#6b2140",
            "#c76b98",
            false,
        ),
    ]
});

pub fn all() -> &'static [Product] {
    &CATALOG
}

pub fn find(id: &str) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.id == id)
}
